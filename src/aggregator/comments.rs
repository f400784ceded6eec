//! Comment aggregation -- one post's comments, each paired with its author.

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::CommentFanOut;
use crate::error::Result;
use crate::fetcher::{Fetcher, decode};
use crate::routes;
use crate::scope::{TaskScope, cancellable};
use crate::types::{Author, Comment, CommentWithAuthor, PostId};

use super::authors::AuthorResolver;

/// Resolves the comments of a post together with their authors.
#[derive(Clone)]
pub struct CommentAggregator {
    fetcher: Fetcher,
    authors: AuthorResolver,
    fan_out: CommentFanOut,
}

impl CommentAggregator {
    /// Create an aggregator using `authors` for the per-comment lookups
    pub fn new(fetcher: Fetcher, authors: AuthorResolver, fan_out: CommentFanOut) -> Self {
        Self {
            fetcher,
            authors,
            fan_out,
        }
    }

    /// Fetch the comments of `post_id` and resolve every comment's author.
    ///
    /// The result keeps the order of the comment listing. The first failed
    /// lookup fails the whole call and cancels the lookups still running for
    /// this post. Cancelling `cancel` stops everything with
    /// [`Error::Cancelled`](crate::Error::Cancelled).
    pub async fn resolve_comments(
        &self,
        post_id: PostId,
        cancel: &CancellationToken,
    ) -> Result<Vec<CommentWithAuthor>> {
        let path = routes::comments(post_id);
        let comments = cancellable(cancel, self.fetcher.fetch(&path, decode::comments)).await?;

        if comments.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            post_id = post_id.get(),
            comments = comments.len(),
            mode = ?self.fan_out,
            "resolving comment authors"
        );

        let authors = match self.fan_out {
            CommentFanOut::Concurrent => self.authors_concurrently(&comments, cancel).await?,
            CommentFanOut::Sequential => self.authors_sequentially(&comments, cancel).await?,
        };

        Ok(comments
            .into_iter()
            .zip(authors)
            .map(|(comment, author)| CommentWithAuthor { comment, author })
            .collect())
    }

    /// One task per comment, joined in listing order.
    async fn authors_concurrently(
        &self,
        comments: &[Comment],
        cancel: &CancellationToken,
    ) -> Result<Vec<Author>> {
        let mut scope = TaskScope::new(cancel);
        for comment in comments {
            let authors = self.authors.clone();
            let author_id = comment.author_id;
            scope.spawn(move |token| async move {
                cancellable(&token, authors.resolve_author(author_id)).await
            });
        }
        scope.join_ordered().await
    }

    /// One lookup at a time; stops at the first failure.
    async fn authors_sequentially(
        &self,
        comments: &[Comment],
        cancel: &CancellationToken,
    ) -> Result<Vec<Author>> {
        let authors = &self.authors;
        stream::iter(comments.iter().map(|c| c.author_id))
            .then(move |author_id| cancellable(cancel, authors.resolve_author(author_id)))
            .try_collect()
            .await
    }
}
