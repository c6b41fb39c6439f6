use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_transcripts::captions::ytdlp::YtDlpCaptionSource;
use channel_transcripts::channel::youtube::YoutubeDataApi;
use channel_transcripts::{
    output, utils, ChannelLister, ChannelTranscriptCollector, Cli, Config, RunSummary,
    TranscriptFetcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "channel_transcripts=debug"
    } else {
        "channel_transcripts=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    config.validate()?;
    tracing::debug!("Configuration: {}", config.describe());

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.app.yt_dlp_path).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - transcripts will be reported as missing)");
    }

    let started = Instant::now();
    let timeout = config.request_timeout();

    let listing = YoutubeDataApi::with_base_url(config.api_key(), &config.youtube.api_base_url, timeout)
        .context("Failed to set up the YouTube Data API client")?;
    let captions = YtDlpCaptionSource::new(&config.app.yt_dlp_path, timeout)
        .context("Failed to set up the caption client")?;

    let collector = ChannelTranscriptCollector::new(
        ChannelLister::new(listing, config.youtube.page_size),
        TranscriptFetcher::new(captions, config.track_preferences()),
        config.channel_id(),
        config.app.max_concurrent_fetches,
    )
    .with_progress(!cli.quiet);

    // Listing failures abort here, before anything is written
    let run = collector.run().await?;
    println!("Found {} videos.", run.results.len());

    let path = &config.app.output_path;
    output::save_to_file(&run, path)?;
    println!("Transcripts saved to: {}", path.display());

    print_summary(&run.summary());
    tracing::info!("Finished in {}", utils::format_duration(started.elapsed()));

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let line = format!("Summary: {}", summary);
    if summary.missing == 0 {
        println!("{}", style(line).green());
    } else {
        println!("{}", style(line).yellow());
        println!("Skipped videos:");
        for skipped in &summary.skipped {
            println!("  • {} ({}): {}", skipped.title, skipped.video_id, skipped.reason);
        }
    }
}
