//! Post aggregation -- the top-level orchestrator.
//!
//! Split into focused submodules:
//! - [`authors`] - single author lookups
//! - [`comments`] - a post's comments paired with their authors
//! - `run` - per-run state machine and events
//!
//! A run is a two-level fan-out. Level one spawns one task per post. Inside
//! each post task the comment aggregation and the post's own author lookup
//! run side by side, and the comment aggregation fans out again over the
//! comments. All tasks of a run share one cancellation tree.

pub mod authors;
pub mod comments;
mod run;

#[cfg(test)]
pub(crate) mod test_helpers;


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::{AggregationConfig, Config};
use crate::error::Result;
use crate::fetcher::{Fetcher, HttpFetcher, Transport, decode};
use crate::routes;
use crate::scope::{TaskScope, cancellable, join_pair};
use crate::types::{Event, Post, PostWithComments, RunId, RunState};

pub use authors::AuthorResolver;
pub use comments::CommentAggregator;

use run::RunTracker;

/// Resolves every post with its comments, comment authors and post author.
pub struct PostAggregator {
    fetcher: Fetcher,
    authors: AuthorResolver,
    comments: CommentAggregator,
    event_tx: broadcast::Sender<Event>,
    next_run: AtomicU64,
}

impl PostAggregator {
    /// Create an aggregator talking HTTP as described by `config`
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is
    /// invalid or the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpFetcher::new(&config.http)?);
        Ok(Self::with_transport(transport, &config.aggregation))
    }

    /// Create an aggregator on top of any [`Transport`]
    pub fn with_transport(transport: Arc<dyn Transport>, config: &AggregationConfig) -> Self {
        let fetcher = Fetcher::new(transport);
        let authors = AuthorResolver::new(fetcher.clone());
        let comments = CommentAggregator::new(fetcher.clone(), authors.clone(), config.comment_fan_out);
        let (event_tx, _rx) = broadcast::channel(config.event_buffer.max(1));

        Self {
            fetcher,
            authors,
            comments,
            event_tx,
            next_run: AtomicU64::new(1),
        }
    }

    /// Subscribe to run events
    ///
    /// Each subscriber receives every event emitted after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Resolve every post, in listing order.
    ///
    /// Either every post is fully resolved or the first failure is returned;
    /// partial results are never produced.
    pub async fn resolve_all(&self) -> Result<Vec<PostWithComments>> {
        self.resolve_all_with_cancel(CancellationToken::new()).await
    }

    /// Like [`resolve_all`](Self::resolve_all), stopping with
    /// [`Error::Cancelled`](crate::Error::Cancelled) when `cancel` fires.
    pub async fn resolve_all_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<Vec<PostWithComments>> {
        let run_id = RunId(self.next_run.fetch_add(1, Ordering::Relaxed));
        let mut run = RunTracker::new(run_id, self.event_tx.clone());
        run.transition(RunState::Running);
        tracing::info!(run_id = run_id.0, "aggregation started");

        let result = self.run(&run, &cancel).await;
        run.finish(result.as_ref().err());

        match &result {
            Ok(posts) => {
                tracing::info!(run_id = run_id.0, posts = posts.len(), "aggregation finished")
            }
            Err(e) if e.is_cancelled() => tracing::info!(run_id = run_id.0, "aggregation cancelled"),
            Err(e) => tracing::warn!(run_id = run_id.0, error = %e, "aggregation failed"),
        }

        result
    }

    async fn run(
        &self,
        run: &RunTracker,
        cancel: &CancellationToken,
    ) -> Result<Vec<PostWithComments>> {
        let posts = cancellable(cancel, self.fetcher.fetch(routes::POSTS, decode::posts)).await?;
        run.emit(Event::PostsListed {
            run_id: run.id(),
            count: posts.len(),
        });

        if posts.is_empty() || !run.state().can_spawn() {
            return Ok(Vec::new());
        }

        let mut scope = TaskScope::new(cancel);
        for post in posts {
            let comments = self.comments.clone();
            let authors = self.authors.clone();
            let event_tx = self.event_tx.clone();
            let run_id = run.id();

            scope.spawn(move |token| async move {
                let resolved = resolve_post(post, &comments, &authors, &token).await?;
                event_tx
                    .send(Event::PostResolved {
                        run_id,
                        post_id: resolved.post.id,
                        comments: resolved.comments_with_author.len(),
                    })
                    .ok();
                Ok(resolved)
            });
        }

        scope.join_ordered().await
    }
}

/// Resolve one post's comments and author side by side.
///
/// If either half fails the other is cancelled and drained before returning.
async fn resolve_post(
    post: Post,
    comments: &CommentAggregator,
    authors: &AuthorResolver,
    cancel: &CancellationToken,
) -> Result<PostWithComments> {
    let scope = cancel.child_token();
    let post_id = post.id;

    let joined = join_pair(
        &scope,
        comments.resolve_comments(post_id, &scope),
        cancellable(&scope, authors.resolve_author(post.author_id)),
    )
    .await;

    match joined {
        Ok((comments_with_author, author)) => Ok(PostWithComments {
            post,
            comments_with_author,
            author,
        }),
        Err(e) => {
            if !e.is_cancelled() {
                tracing::debug!(post_id = post_id.get(), error = %e, "post resolution failed");
            }
            Err(e)
        }
    }
}
