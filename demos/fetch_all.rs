//! Fetch-all example
//!
//! Runs one aggregation against the configured API and prints every post with
//! its comments and authors as pretty JSON.
//!
//! Usage: `cargo run --example fetch_all [config.json]`
//!
//! Without a config file the defaults apply (API at
//! `http://127.0.0.1:9999/api/slow`). Set `RUST_LOG=post_aggregator=debug` to
//! watch the requests go out. Ctrl+C cancels the run.

use post_aggregator::{Config, Event, PostAggregator, resolve_until_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    println!("Fetching from {}", config.http.base_url);

    let aggregator = PostAggregator::new(&config)?;

    let mut events = aggregator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::PostsListed { count, .. } => println!("✓ Listed {} posts", count),
                Event::PostResolved {
                    post_id, comments, ..
                } => println!("  post {} resolved ({} comments)", post_id, comments),
                Event::RunFailed { code, error, .. } => eprintln!("✗ {}: {}", code, error),
                _ => {}
            }
        }
    });

    let started = std::time::Instant::now();
    let posts = resolve_until_shutdown(&aggregator).await?;

    println!("{}", serde_json::to_string_pretty(&posts)?);
    println!(
        "Resolved {} posts in {:.2}s",
        posts.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
