//! # post-aggregator
//!
//! Concurrent aggregation of blog posts with their comments and authors.
//!
//! A run lists every post, then for each post fetches its comments, the author
//! of every comment and the post's own author, all concurrently. The result is
//! a list of [`PostWithComments`] in listing order, or the first failure.
//!
//! ## Design Philosophy
//!
//! - **All or nothing** - a run never returns partial results
//! - **Fail fast** - the first failure cancels every outstanding request
//! - **Order preserving** - posts and comments keep their listing order
//! - **Event-driven** - consumers subscribe to run events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use post_aggregator::{Config, PostAggregator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.http.base_url = "http://127.0.0.1:9999/api/slow".to_string();
//!
//!     let aggregator = PostAggregator::new(&config)?;
//!
//!     let mut events = aggregator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     for post in aggregator.resolve_all().await? {
//!         println!("{} has {} comments", post.post.id, post.comments_with_author.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Post, comment and author aggregation
pub mod aggregator;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// HTTP transport and response decoding
pub mod fetcher;
/// Remote resource paths
pub mod routes;
/// Cancellation scopes for nested fan-out
pub mod scope;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use aggregator::{AuthorResolver, CommentAggregator, PostAggregator};
pub use config::{AggregationConfig, CommentFanOut, Config, HttpConfig};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, HttpFetcher, Transport};
pub use types::{
    Author, AuthorId, Comment, CommentId, CommentWithAuthor, Event, Post, PostId,
    PostWithComments, RunId, RunState,
};

use tokio_util::sync::CancellationToken;

/// Resolve every post, cancelling the run on a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// A signal yields [`Error::Cancelled`].
///
/// # Example
///
/// ```no_run
/// use post_aggregator::{Config, PostAggregator, resolve_until_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let aggregator = PostAggregator::new(&Config::default())?;
///     let posts = resolve_until_shutdown(&aggregator).await?;
///     println!("{} posts", posts.len());
///     Ok(())
/// }
/// ```
pub async fn resolve_until_shutdown(aggregator: &PostAggregator) -> Result<Vec<PostWithComments>> {
    resolve_until(aggregator, wait_for_signal()).await
}

/// Resolve every post, cancelling the run once `shutdown` completes.
async fn resolve_until<S>(aggregator: &PostAggregator, shutdown: S) -> Result<Vec<PostWithComments>>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown => cancel.cancel(),
                _ = cancel.cancelled() => {}
            }
        })
    };

    let result = aggregator.resolve_all_with_cancel(cancel.clone()).await;
    // Stops the watcher if the run finished on its own
    cancel.cancel();
    watcher.await.ok();
    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // May fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal, cancelling run");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C), cancelling run");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C signal, cancelling run");
            } else {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal, cancelling run");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
