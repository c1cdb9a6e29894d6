//! CLI binary for markpress.
//!
//! A thin shim over the library crate that maps CLI flags to the publish
//! and validate flows and prints results. Secrets are resolved here (flag
//! or environment) and handed to the library as explicit values.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use markpress::pipeline::format_bytes;
use markpress::{
    publish, validate, Config, Credentials, PublishOptions, WordPressClient,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "markpress",
    version,
    about = "Publish Markdown posts to WordPress as native Gutenberg blocks",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "markpress.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a markdown file (uploads images, creates the post).
    Publish {
        /// Markdown file to publish.
        file: PathBuf,

        /// Force draft status regardless of frontmatter.
        #[arg(long)]
        draft: bool,

        /// Preview the generated blocks without touching the remote.
        #[arg(long)]
        dry_run: bool,

        /// Application password for the configured user.
        #[arg(long, env = "MARKPRESS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Validate a markdown file without publishing.
    Validate {
        /// Markdown file to check.
        file: PathBuf,

        /// Print the full frontmatter, image details, and block preview.
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {e:#}", red("error:"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Publish {
            file,
            draft,
            dry_run,
            password,
        } => {
            if dry_run {
                run_dry_run(&cli.config, &file).await
            } else {
                run_publish(&cli.config, &file, draft, password).await
            }
        }
        Command::Validate { file, verbose } => run_validate(&cli.config, &file, verbose).await,
    }
}

// ── publish ──────────────────────────────────────────────────────────────────

async fn run_publish(
    config_path: &PathBuf,
    file: &PathBuf,
    draft: bool,
    password: Option<String>,
) -> Result<()> {
    let config = Config::load(config_path)
        .await
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let password = password.context(
        "no application password: pass --password or set MARKPRESS_PASSWORD",
    )?;
    let credentials = Credentials {
        username: config.site.username.clone(),
        password,
    };
    let client = WordPressClient::new(&config.site.url, &credentials);

    println!("{} {}", bold("Publishing"), file.display());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Reconciling images and creating post…");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let options = PublishOptions { force_draft: draft };
    let result = publish(file, &client, &config, &options).await;
    spinner.finish_and_clear();

    let outcome = result?;
    println!(
        "  {} uploaded {} image(s), reused {} from cache",
        green("✓"),
        outcome.uploaded,
        outcome.reused
    );
    println!(
        "  {} post {} created as {} — {}",
        green("✓"),
        outcome.post_id,
        outcome.status,
        outcome.link
    );
    if !outcome.frontmatter_updated {
        println!(
            "  {} frontmatter write-back failed; add wp_post_id: {} manually",
            yellow("!"),
            outcome.post_id
        );
    }
    Ok(())
}

// ── dry run / validate ───────────────────────────────────────────────────────

async fn run_dry_run(config_path: &PathBuf, file: &PathBuf) -> Result<()> {
    // A dry run needs no credentials and tolerates a missing config.
    let config = match Config::load(config_path).await {
        Ok(config) => config,
        Err(_) => {
            println!("{}", dim("no config found, using defaults for dry run"));
            Config::default()
        }
    };
    let outcome = validate(file, &config).await?;

    print_image_summary(&outcome, true);
    println!("{}", bold("Generated Gutenberg content:"));
    println!("{}", dim(&"─".repeat(60)));
    println!("{}", outcome.preview);
    println!("{}", dim(&"─".repeat(60)));
    println!("{}", dim("dry run — nothing was sent to the remote"));

    if !outcome.passed() {
        anyhow::bail!("a real publish would fail: fix the image errors above");
    }
    Ok(())
}

async fn run_validate(config_path: &PathBuf, file: &PathBuf, verbose: bool) -> Result<()> {
    let config = match Config::load(config_path).await {
        Ok(config) => config,
        Err(_) => Config::default(),
    };
    let outcome = validate(file, &config).await?;
    let fm = &outcome.document.frontmatter;

    println!("{}", bold("Frontmatter"));
    println!("  Title:  {}", fm.title);
    println!(
        "  Status: {}",
        fm.status.unwrap_or_default().as_str()
    );
    if let Some(slug) = &fm.slug {
        println!("  Slug:   {slug}");
    }
    if let Some(tags) = &fm.tags {
        println!("  Tags:   {}", tags.join(", "));
    }
    if let Some(categories) = &fm.categories {
        println!("  Categories: {}", categories.join(", "));
    }
    println!();

    print_image_summary(&outcome, verbose);

    println!("{}", bold("Blocks"));
    println!("  Generated: {}", outcome.block_count);
    if verbose {
        println!("{}", dim(&"─".repeat(60)));
        println!("{}", outcome.preview);
        println!("{}", dim(&"─".repeat(60)));
    }
    println!();

    if outcome.passed() {
        println!("{}", green("VALIDATION PASSED"));
        Ok(())
    } else {
        println!("{}", red("VALIDATION FAILED"));
        anyhow::bail!("{} image(s) have problems", outcome.report.error_count());
    }
}

fn print_image_summary(outcome: &markpress::ValidationOutcome, detailed: bool) {
    let report = &outcome.report;
    if report.images.is_empty() {
        println!("{}", dim("No images referenced"));
        println!();
        return;
    }

    println!("{}", bold("Images"));
    println!("  Total:     {}", report.images.len());
    println!("  Cached:    {}", report.cache_hits());
    println!("  To upload: {}", report.pending_uploads());
    let pending = report.pending_upload_bytes();
    if pending > 0 {
        println!("  Upload size: {}", format_bytes(pending));
    }

    if detailed {
        for img in &report.images {
            let mark = if img.has_errors() {
                red("✗")
            } else {
                green("✓")
            };
            println!("  {mark} {}", img.reference.path);
            println!("      {}", dim(&img.validation.absolute_path.display().to_string()));
            if let Some(size) = img.validation.size {
                println!("      {}", dim(&format_bytes(size)));
            }
            for err in &img.validation.errors {
                println!("      {} {err}", red("error:"));
            }
            for warning in &img.validation.warnings {
                println!("      {} {warning}", yellow("warning:"));
            }
        }
    } else {
        for img in report.images.iter().filter(|img| img.has_errors()) {
            for err in &img.validation.errors {
                println!("  {} {err}", red("✗"));
            }
        }
    }
    println!();
}
