//! Cancellation scopes for nested fan-out/fan-in.
//!
//! A [`TaskScope`] owns a child [`CancellationToken`] and a [`JoinSet`] of
//! indexed tasks. Joining it yields the results in spawn order, or the first
//! real failure to arrive. On that failure the scope token is cancelled, every
//! sibling observes it at its next suspension point, and the scope drains them
//! before returning. Because the token is a child of the caller's token,
//! cancelling an outer scope reaches every nested one.
//!
//! Tasks are handed their token and must check it themselves, normally by
//! wrapping each I/O call in [`cancellable`]. Nested scopes are therefore
//! drained rather than aborted.

use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Run `fut` unless `token` is cancelled first.
///
/// Cancellation wins ties, and dropping `fut` releases whatever it holds
/// (an in-flight response, a semaphore permit).
pub async fn cancellable<F, T>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Run two fallible futures side by side under `token`.
///
/// The first real failure cancels `token` so the other half winds down; both
/// halves are always driven to completion. Returns that first failure, or
/// [`Error::Cancelled`] if `token` was cancelled from outside.
pub async fn join_pair<A, B, FA, FB>(token: &CancellationToken, a: FA, b: FB) -> Result<(A, B)>
where
    FA: Future<Output = Result<A>>,
    FB: Future<Output = Result<B>>,
{
    let ((a, a_first), (b, b_first)) = tokio::join!(settle(token, a), settle(token, b));

    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(ea), Err(eb)) => {
            let prefer_b = b_first || (!a_first && ea.is_cancelled() && !eb.is_cancelled());
            Err(if prefer_b { eb } else { ea })
        }
    }
}

/// Await `fut`; on a real failure cancel `token` and report whether this was
/// the first one to do so.
async fn settle<T, F>(token: &CancellationToken, fut: F) -> (Result<T>, bool)
where
    F: Future<Output = Result<T>>,
{
    let result = fut.await;
    let first = match &result {
        Err(e) if !e.is_cancelled() => {
            let first = !token.is_cancelled();
            token.cancel();
            first
        }
        _ => false,
    };
    (result, first)
}

/// A set of sibling tasks that succeed together or fail together.
pub struct TaskScope<T> {
    token: CancellationToken,
    tasks: JoinSet<(usize, Result<T>)>,
    spawned: usize,
    refused: bool,
}

impl<T: Send + 'static> TaskScope<T> {
    /// Open a scope nested under `parent`
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            tasks: JoinSet::new(),
            spawned: 0,
            refused: false,
        }
    }

    /// Number of tasks spawned so far
    pub fn len(&self) -> usize {
        self.spawned
    }

    /// Whether nothing has been spawned
    pub fn is_empty(&self) -> bool {
        self.spawned == 0
    }

    /// Spawn the next positional task, built from the scope's token.
    ///
    /// Once the scope is cancelled nothing more is spawned; the join then
    /// reports [`Error::Cancelled`].
    pub fn spawn<M, F>(&mut self, make: M)
    where
        M: FnOnce(CancellationToken) -> F,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if self.token.is_cancelled() {
            self.refused = true;
            return;
        }

        let index = self.spawned;
        self.spawned += 1;
        let task = make(self.token.clone());
        self.tasks.spawn(async move { (index, task.await) });
    }

    /// Wait for every task and return their values in spawn order.
    ///
    /// The first failure that is not itself a cancellation is returned and
    /// cancels the rest; later failures are discarded. If the only failures
    /// are cancellations (an outer scope was cancelled), the result is
    /// [`Error::Cancelled`].
    pub async fn join_ordered(mut self) -> Result<Vec<T>> {
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
            .take(self.spawned)
            .collect();
        let mut first_error: Option<Error> = None;
        let mut cancelled = self.refused;

        while let Some(joined) = self.tasks.join_next().await {
            let error = match joined {
                Ok((index, Ok(value))) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(value);
                    }
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(e) => join_error(e),
            };

            if error.is_cancelled() {
                cancelled = true;
            } else if first_error.is_none() {
                tracing::debug!(
                    error = %error,
                    remaining = self.tasks.len(),
                    "task failed, cancelling siblings"
                );
                self.token.cancel();
                first_error = Some(error);
            } else {
                tracing::trace!(error = %error, "discarding later failure");
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }
        if cancelled {
            return Err(Error::Cancelled);
        }

        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| Error::TaskPanicked("task finished without a result".to_string()))
    }
}

fn join_error(e: JoinError) -> Error {
    if e.is_cancelled() {
        Error::Cancelled
    } else {
        Error::TaskPanicked(e.to_string())
    }
}
