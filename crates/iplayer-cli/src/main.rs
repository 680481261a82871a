//! iPlayer Links command-line front end
//!
//! Crawls one BBC iPlayer program and prints (or saves) the direct links to
//! all of its episodes.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use iplayer_core::{validate_source_url, ClientConfig, CrawlOptions, IplayerCrawler};

#[derive(Debug, Parser)]
#[command(name = "iplayer-links")]
#[command(about = "Print direct links to every episode of a BBC iPlayer program", version)]
struct Cli {
    /// iPlayer program URL with episodes
    #[arg(long)]
    url: String,

    /// Include audio-described episodes
    #[arg(long, default_value_t = false)]
    audio_described: bool,

    /// Include sign-language episodes
    #[arg(long, default_value_t = false)]
    sign_language: bool,

    /// Print the episodes grouped by series as JSON instead of plain links
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Save the output to this file instead of printing it
    #[arg(long)]
    output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    validate_source_url(&cli.url)?;

    let crawler = IplayerCrawler::with_config(ClientConfig {
        timeout_secs: cli.timeout,
        ..ClientConfig::default()
    })?;
    let options = CrawlOptions::new(cli.audio_described, cli.sign_language);

    let all = crawler
        .crawl(&cli.url, options)
        .await
        .with_context(|| format!("failed to collect episodes from {}", cli.url))?;

    if all.is_empty() {
        eprintln!("No episodes found");
        return Ok(());
    }

    let text = if cli.json {
        output::render_json(&all)?
    } else {
        output::render_links(&all)
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Saved {} episode link(s) to {}",
                output::episode_count(&all),
                path.display()
            );
        }
        None => println!("{}", text),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "iplayer-links",
            "--url",
            "https://www.bbc.co.uk/iplayer/episodes/b006q2x0/doctor-who",
            "--sign-language",
            "-vv",
        ])
        .unwrap();
        assert!(cli.sign_language);
        assert!(!cli.audio_described);
        assert!(!cli.json);
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.verbose, 2);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_cli_requires_url() {
        assert!(Cli::try_parse_from(["iplayer-links"]).is_err());
    }

    #[tokio::test]
    async fn test_run_rejects_non_iplayer_url() {
        let cli =
            Cli::try_parse_from(["iplayer-links", "--url", "https://example.com/show"]).unwrap();
        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("Invalid URL"));
    }
}
