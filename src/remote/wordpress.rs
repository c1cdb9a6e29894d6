//! WordPress REST API client.
//!
//! Talks to the standard `wp-json/wp/v2` routes with an application
//! password over Basic auth. The auth header is computed once at
//! construction; credentials arrive as an explicit [`Credentials`] value
//! and are never read from the environment here.

use crate::config::Credentials;
use crate::error::Error;
use crate::remote::{MediaItem, Platform, PostInput, PostRecord};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use tracing::debug;

/// REST client for one WordPress site.
pub struct WordPressClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl WordPressClient {
    /// Build a client for `site_url` (with or without trailing slash).
    pub fn new(site_url: &str, credentials: &Credentials) -> Self {
        let token = BASE64.encode(format!(
            "{}:{}",
            credentials.username, credentials.password
        ));
        Self {
            http: reqwest::Client::new(),
            base_url: site_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {token}"),
        }
    }

    fn api_url(&self, route: &str) -> String {
        format!("{}/wp-json/wp/v2{route}", self.base_url)
    }

    /// Turn a non-success response into [`Error::RemoteApi`] with whatever
    /// body the server sent (WordPress errors are short JSON blobs).
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::RemoteApi {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Platform for WordPressClient {
    async fn upload_media(&self, path: &Path, alt: Option<&str>) -> Result<MediaItem, Error> {
        let bytes = tokio::fs::read(path).await.map_err(|e| Error::UploadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        let mut form = Form::new().part(
            "file",
            Part::bytes(bytes)
                .file_name(file_name.clone())
                .mime_str(guess_mime(path))?,
        );
        if let Some(alt) = alt {
            form = form.text("alt_text", alt.to_string());
        }

        debug!(file = %file_name, "uploading media");
        let response = self
            .http
            .post(self.api_url("/media"))
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UploadFailed {
                path: path.to_path_buf(),
                detail: format!("HTTP {status}: {body}"),
            });
        }
        Ok(response.json::<MediaItem>().await?)
    }

    async fn verify_media(&self, id: u64) -> Result<bool, Error> {
        let response = self
            .http
            .get(self.api_url(&format!("/media/{id}")))
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .await?;
        // Any non-success means "not usable", most commonly a 404 after
        // the media library was cleaned out.
        Ok(response.status().is_success())
    }

    async fn create_post(&self, post: &PostInput) -> Result<PostRecord, Error> {
        let response = self
            .http
            .post(self.api_url("/posts"))
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .json(post)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<PostRecord>().await?)
    }

    async fn update_post(&self, id: u64, post: &PostInput) -> Result<PostRecord, Error> {
        let response = self
            .http
            .put(self.api_url(&format!("/posts/{id}")))
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .json(post)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<PostRecord>().await?)
    }

    async fn get_post(&self, id: u64) -> Result<PostRecord, Error> {
        let response = self
            .http
            .get(self.api_url(&format!("/posts/{id}")))
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .await?;
        Ok(Self::check(response).await?.json::<PostRecord>().await?)
    }

    async fn delete_post(&self, id: u64) -> Result<(), Error> {
        let response = self
            .http
            .delete(self.api_url(&format!("/posts/{id}")))
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .await?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::RemoteApi {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

/// Content type from the file extension; WordPress rejects uploads whose
/// declared type it does not allow, so octet-stream is a last resort.
fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WordPressClient {
        WordPressClient::new(
            "https://blog.example.com/",
            &Credentials {
                username: "editor".into(),
                password: "abcd efgh".into(),
            },
        )
    }

    #[test]
    fn api_url_handles_trailing_slash() {
        let c = client();
        assert_eq!(
            c.api_url("/media"),
            "https://blog.example.com/wp-json/wp/v2/media"
        );
        assert_eq!(
            c.api_url("/posts/42"),
            "https://blog.example.com/wp-json/wp/v2/posts/42"
        );
    }

    #[test]
    fn auth_header_is_basic_base64() {
        let c = client();
        assert_eq!(
            c.auth_header,
            format!("Basic {}", BASE64.encode("editor:abcd efgh"))
        );
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_mime(Path::new("a/b.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("no_extension")), "application/octet-stream");
    }
}
