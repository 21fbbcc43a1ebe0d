//! # chanarchive CLI
//!
//! Command-line interface for the chanarchive library.

use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use chanarchive::ArchiveError;
use chanarchive::cli::Args;
use chanarchive::core::ArchivePipeline;
use chanarchive::progress::{Progress, ProgressCallback};
use chanarchive::source::{DiscordClient, HttpFetcher};

fn main() {
    let args = <Args as ClapParser>::parse();
    init_tracing(&args);

    if let Err(e) = run(&args) {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), ArchiveError> {
    let total_start = Instant::now();
    let config = args.to_config();
    config.validate()?;

    // Print header
    println!("📦 chanarchive v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("💬 Channel: {}", config.channel_id);
    if let Some(ref before) = config.start_before {
        println!("⏮️  Before:  {}", before);
    }
    println!("📂 Output:  {}", config.root_dir.display());
    if config.strict {
        println!("🛑 Mode:    Strict");
    }
    println!();

    config.prepare_dirs()?;
    let source = DiscordClient::new(&config)?;
    let content = HttpFetcher::new(config.connect_timeout, config.request_timeout)?;

    let progress: ProgressCallback = Arc::new(|p: Progress| {
        println!(
            "   Page {}: {} messages ({} total, {} assets)",
            p.pages_fetched,
            p.last_page_len,
            p.messages_archived,
            p.assets_total()
        );
    });

    println!("⏳ Fetching history...");
    let summary = ArchivePipeline::new(config, source, content)
        .with_progress(progress)
        .run()?;
    let total_time = total_start.elapsed();

    println!();
    if let Some(ref path) = summary.output_path {
        println!("✅ Done! Archive saved to {}", path.display());
    }

    // Summary
    println!();
    println!("📊 Summary:");
    println!("   Messages:  {}", summary.message_count());
    println!("   Pages:     {}", summary.pages_fetched);
    println!(
        "   Assets:    {} downloaded, {} cached, {} failed",
        summary.assets.downloaded, summary.assets.cached, summary.assets.failed
    );
    if summary.duplicates_skipped > 0 {
        println!("   Skipped:   {} duplicates", summary.duplicates_skipped);
    }
    if let (Some(oldest), Some(newest)) = (summary.oldest, summary.newest) {
        println!(
            "   Span:      {} → {}",
            oldest.format("%Y-%m-%d %H:%M"),
            newest.format("%Y-%m-%d %H:%M")
        );
    }

    // Performance stats
    println!();
    println!("⚡ Performance:");
    println!("   Total time:  {:.2}s", total_time.as_secs_f64());

    Ok(())
}
