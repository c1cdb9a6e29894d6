//! Configuration types for publishing.
//!
//! All behaviour outside a single markdown file is controlled through
//! [`Config`], normally loaded from a small TOML file. Credentials are
//! **not** part of it: the library never reaches into environment variables
//! or any other ambient process state itself — the caller (the CLI, a test)
//! resolves the password and hands it over as a plain [`Credentials`] value.

use crate::document::Status;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory for markpress-owned local state (the image cache).
pub const DEFAULT_CACHE_DIR: &str = ".markpress";

/// Publishing configuration, typically loaded from `markpress.toml`.
///
/// # Example
/// ```toml
/// [site]
/// url = "https://blog.example.com"
/// username = "editor"
///
/// [posts]
/// default_status = "draft"
///
/// [images]
/// base_path = "assets"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub posts: PostsConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// The target WordPress site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site base URL, e.g. `https://blog.example.com`.
    pub url: String,
    /// Account name the application password belongs to.
    pub username: String,
}

/// Post-creation defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsConfig {
    /// Status used when the frontmatter does not specify one. Default: draft.
    #[serde(default)]
    pub default_status: Status,
}

/// Image resolution overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Resolve relative image paths against this directory instead of the
    /// markdown file's own directory.
    #[serde(default)]
    pub base_path: Option<PathBuf>,
}

/// Local cache location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding `cache.json`. Default: [`DEFAULT_CACHE_DIR`].
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl Config {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let config: Config =
            toml::from_str(raw).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file. Discovery of *which* file to read is
    /// the caller's problem; this takes an explicit path.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.site.url.is_empty() {
            return Err(Error::InvalidConfig("site.url must be set".into()));
        }
        if !self.site.url.starts_with("http://") && !self.site.url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "site.url must be an http(s) URL, got {:?}",
                self.site.url
            )));
        }
        if self.site.username.is_empty() {
            return Err(Error::InvalidConfig("site.username must be set".into()));
        }
        Ok(())
    }
}

/// Explicit credential value for the remote platform.
///
/// Constructed by the caller from wherever secrets live (flag, env var,
/// keychain) and passed down; the library treats it as opaque input.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    // Keep passwords out of logs and error chains.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = Config::from_toml_str(
            "[site]\nurl = \"https://blog.example.com\"\nusername = \"editor\"\n",
        )
        .unwrap();
        assert_eq!(config.site.url, "https://blog.example.com");
        assert_eq!(config.posts.default_status, Status::Draft);
        assert_eq!(config.cache.dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert!(config.images.base_path.is_none());
    }

    #[test]
    fn rejects_non_http_url() {
        let err =
            Config::from_toml_str("[site]\nurl = \"blog.example.com\"\nusername = \"e\"\n")
                .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let err = Config::from_toml_str(
            "[site]\nurl = \"https://x.com\"\nusername = \"e\"\n[wordpresss]\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "editor".into(),
            password: "hunter2".into(),
        };
        let out = format!("{creds:?}");
        assert!(!out.contains("hunter2"));
    }
}
