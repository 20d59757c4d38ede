//! One-shot ingestion run
//!
//! This example demonstrates the core functionality of wall-ingest:
//! - Loading configuration from the environment (or a `.env` file)
//! - Subscribing to progress events
//! - Running the pipeline once over every configured channel
//! - Listing the unused posts a downstream consumer would pick up
//!
//! ```text
//! TOKEN_VK=... CHANNEL_LIST="apiclub team" cargo run --example ingest
//! ```

use wall_ingest::{Config, Event, Pipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let pipeline = Pipeline::new(config)?;

    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::ChannelResolved { identifier, id, name } => {
                    println!("✓ {} resolved to #{} ({})", identifier, id, name);
                }
                Event::PhotoSkipped {
                    channel,
                    post_id,
                    position,
                    reason,
                } => {
                    println!("⚠ {}/{} photo {} skipped: {}", channel, post_id, position, reason);
                }
                Event::ChannelFailed { identifier, error, .. } => {
                    println!("✗ {} failed: {}", identifier, error);
                }
                _ => {}
            }
        }
    });

    let report = pipeline.run().await;

    for channel in report.succeeded() {
        println!(
            "{}: {} posts, {} new, {} already recorded, {} photos ({} skipped)",
            channel.channel.name,
            channel.posts_fetched,
            channel.records_inserted,
            channel.duplicates,
            channel.photos_saved,
            channel.photos_skipped,
        );

        let unused = pipeline.unused_post_files(&channel.channel.name).await?;
        println!("  {} unused posts ready for hand-off", unused.len());
    }
    for (identifier, error) in report.failed() {
        println!("{}: failed ({})", identifier, error);
    }

    println!("Total time: {:.2?}", report.elapsed);
    Ok(())
}
