// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 The medium2dev Authors

//! Command-line interface for medium2dev.
//!
//! This binary provides the `medium2dev` command for converting a Medium
//! article to DEV.to Markdown, saving its images, and optionally creating a
//! DEV.to draft.

use lexopt::prelude::*;
use medium2dev::devto::{self, DevToClient};
use medium2dev::fetch::{self, Fetcher};
use medium2dev::frontmatter;
use medium2dev::renderer::{self, RenderOptions};
use snafu::{OptionExt, ensure, prelude::*};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    url: Option<String>,
    output_dir: PathBuf,
    image_dir: String,
    html: Option<PathBuf>,
    tags: Vec<String>,
    heading_offset: u8,
    include_date: bool,
    publish: bool,
    api_key: Option<String>,
    quiet: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("failed to set up logging: {source}"))]
    Logging {
        source: tracing_subscriber::util::TryInitError,
    },

    #[snafu(display("an article URL or --html file is required"))]
    NoInput,

    #[snafu(display("cannot publish: {source}"))]
    PublishSetup { source: devto::PublishError },

    #[snafu(display("cannot derive an output filename from the article URL"))]
    InvalidSlug,

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to fetch article: {source}"))]
    Fetch { source: fetch::FetchError },

    #[snafu(display("{source}"))]
    Convert { source: medium2dev::Error },

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to publish to DEV.to: {source}"))]
    Publish { source: devto::PublishError },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert a Medium article to DEV.to Markdown

Usage: {name} [OPTIONS] <URL>

Arguments:
  <URL>  Address of the Medium article

Options:
  -o, --output-dir <DIR>    Directory for the Markdown file (default: .)
  -i, --image-dir <NAME>    Image directory, relative to the output directory (default: images)
      --html <FILE>         Read the article HTML from a file instead of fetching it
  -t, --tag <TAG>           Frontmatter tag (repeatable, at most 4)
      --heading-offset <N>  Shift heading levels by N (0-5, default: 0)
      --with-date           Include the publication date in the frontmatter

Publishing:
  -p, --publish             Create a DEV.to draft from the result
  -k, --api-key <KEY>       DEV.to API key (default: ${key_env})

Other options:
  -q, --quiet               Suppress progress messages
  -n, --dry-run             Show what would be written without writing
  -f, --force               Overwrite an existing Markdown file
  -h, --help                Print help
  -V, --version             Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        key_env = devto::API_KEY_ENV,
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut url = None;
    let mut output_dir = PathBuf::from(".");
    let mut image_dir = renderer::DEFAULT_IMAGE_DIR.to_owned();
    let mut html = None;
    let mut tags = Vec::new();
    let mut heading_offset: u8 = 0;
    let mut include_date = false;
    let mut publish = false;
    let mut api_key = None;
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output-dir") => output_dir = parser.value()?.parse()?,
            Short('i') | Long("image-dir") => image_dir = parser.value()?.parse()?,
            Long("html") => html = Some(parser.value()?.parse()?),
            Short('t') | Long("tag") => tags.push(parser.value()?.parse()?),
            Long("heading-offset") => {
                let val: u8 = parser
                    .value()?
                    .parse()
                    .map_err(|_| "heading-offset must be a number 0-5")?;
                if val > 5 {
                    return Err("heading-offset must be 0-5".into());
                }
                heading_offset = val;
            }
            Long("with-date") => include_date = true,
            Short('p') | Long("publish") => publish = true,
            Short('k') | Long("api-key") => api_key = Some(parser.value()?.parse()?),
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if url.is_none() => url = Some(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        url,
        output_dir,
        image_dir,
        html,
        tags,
        heading_offset,
        include_date,
        publish,
        api_key,
        quiet,
        dry_run,
        force,
    })
}

/// Installs a stderr log subscriber; `RUST_LOG` overrides the default level.
fn init_logging(quiet: bool) -> Result<(), Error> {
    let default = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
        .try_init()
        .context(LoggingSnafu)
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(cli.quiet)?;

    ensure!(cli.url.is_some() || cli.html.is_some(), NoInputSnafu);

    // Fail on a missing key before any network or disk work.
    let publisher = if cli.publish {
        let key = cli
            .api_key
            .clone()
            .or_else(|| std::env::var(devto::API_KEY_ENV).ok())
            .unwrap_or_default();
        Some(DevToClient::new(&key).context(PublishSetupSnafu)?)
    } else {
        None
    };

    let slug = article_slug(&cli).context(InvalidSlugSnafu)?;
    let out_path = cli.output_dir.join(format!("{slug}.md"));

    if out_path.exists() && !cli.force && !cli.dry_run {
        eprintln!(
            "Skipping {} (already exists, use --force to overwrite)",
            out_path.display()
        );
        return Ok(());
    }

    let fetcher = Fetcher::new().context(FetchSnafu)?;
    let html = match (&cli.html, &cli.url) {
        (Some(path), _) => std::fs::read_to_string(path).context(ReadFileSnafu { path })?,
        (None, Some(url)) => fetcher.fetch_article(url).context(FetchSnafu)?,
        (None, None) => return NoInputSnafu.fail(),
    };

    let opts = make_render_options(&cli);
    let conversion =
        medium2dev::convert(&html, cli.url.as_deref(), &opts).context(ConvertSnafu)?;
    let markdown = &conversion.result.markdown;

    if cli.dry_run {
        eprintln!("Would write {}", out_path.display());
        for image in &conversion.result.images {
            eprintln!(
                "Would download {} to {}",
                image.source_url,
                cli.output_dir.join(&image.local_path).display()
            );
        }
        if publisher.is_some() {
            eprintln!("Would create a DEV.to draft");
        }
        print!("{}", conversion.word_counts.table());
        return Ok(());
    }

    std::fs::create_dir_all(&cli.output_dir).context(CreateOutputDirSnafu)?;
    download_images(&fetcher, &conversion.result.images, &cli);

    std::fs::write(&out_path, markdown).context(WriteFileSnafu { path: &out_path })?;
    if !cli.quiet {
        eprintln!("Wrote {}", out_path.display());
    }

    print!("{}", conversion.word_counts.table());

    if let Some(client) = publisher {
        let title = match conversion.metadata.title.trim() {
            "" => frontmatter::UNTITLED,
            title => title,
        };
        let draft = client.create_draft(title, markdown).context(PublishSnafu)?;
        if !cli.quiet {
            eprintln!("Created DEV.to draft {} ({})", draft.id, draft.url);
        }
    }

    Ok(())
}

/// Creates render options from CLI arguments.
fn make_render_options(cli: &Cli) -> RenderOptions {
    RenderOptions {
        image_dir: cli.image_dir.clone(),
        tags: cli.tags.clone(),
        heading_offset: cli.heading_offset,
        include_date: cli.include_date,
    }
}

/// Downloads images in document order. Failures are logged and skipped so
/// the Markdown is still written.
fn download_images(fetcher: &Fetcher, images: &[medium2dev::images::ImageReference], cli: &Cli) {
    let mut saved = 0;
    for image in images {
        let dest = cli.output_dir.join(&image.local_path);
        match fetcher.download(&image.source_url, &dest) {
            Ok(_) => saved += 1,
            Err(e) => warn!(url = %image.source_url, "skipping image: {e}"),
        }
    }
    if !cli.quiet && !images.is_empty() {
        eprintln!("Saved {saved} of {} images", images.len());
    }
}

/// Output file stem: the last path segment of the article URL, or the
/// `--html` file stem.
fn article_slug(cli: &Cli) -> Option<String> {
    let from_url = cli.url.as_deref().and_then(|url| {
        let url = Url::parse(url).ok()?;
        url.path_segments()?
            .filter(|segment| !segment.is_empty())
            .next_back()
            .map(ToOwned::to_owned)
    });
    let raw = from_url.or_else(|| {
        cli.html
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
    })?;

    let slug: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    (!slug.is_empty()).then(|| slug.to_owned())
}
