//! In-memory transport for exercising the aggregators without a network.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fetcher::Transport;

/// What a mocked path answers with
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    Json(String),
    Status(u16),
    Empty,
    Panic,
}

#[derive(Clone, Debug)]
struct Route {
    reply: Reply,
    delay: Duration,
}

/// Request counters shared with the test body.
#[derive(Default)]
pub(crate) struct Stats {
    pub(crate) started: AtomicUsize,
    pub(crate) completed: AtomicUsize,
    /// Requests whose future was dropped before the reply arrived
    pub(crate) abandoned: AtomicUsize,
}

struct InFlight<'a> {
    stats: &'a Stats,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn start(stats: &'a Stats) -> Self {
        stats.started.fetch_add(1, Ordering::SeqCst);
        Self { stats, done: false }
    }

    fn complete(mut self) {
        self.done = true;
        self.stats.completed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.stats.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A [`Transport`] answering from a fixed route table.
///
/// Unknown paths answer 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: HashMap<String, Route>,
    log: Mutex<Vec<String>>,
    pub(crate) stats: Stats,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, path: &str, reply: Reply) -> Self {
        self.routes.insert(
            path.to_string(),
            Route {
                reply,
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub(crate) fn delayed(mut self, path: &str, delay_ms: u64, reply: Reply) -> Self {
        self.routes.insert(
            path.to_string(),
            Route {
                reply,
                delay: Duration::from_millis(delay_ms),
            },
        );
        self
    }

    pub(crate) fn json(self, path: &str, body: &str) -> Self {
        self.route(path, Reply::Json(body.to_string()))
    }

    pub(crate) fn author(self, id: i64, name: &str) -> Self {
        self.json(
            &format!("/authors/{id}"),
            &format!(r#"{{"id":{id},"name":"{name}"}}"#),
        )
    }

    pub(crate) fn slow_author(self, id: i64, name: &str, delay_ms: u64) -> Self {
        let body = format!(r#"{{"id":{id},"name":"{name}"}}"#);
        self.delayed(&format!("/authors/{id}"), delay_ms, Reply::Json(body))
    }

    /// Paths requested so far, in request order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.log.lock().unwrap().push(path.to_string());
        let url = format!("mock://{path}");

        let Some(route) = self.routes.get(path).cloned() else {
            return Err(Error::HttpStatus {
                url,
                status: 404,
                reason: "Not Found".to_string(),
            });
        };

        let in_flight = InFlight::start(&self.stats);
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        in_flight.complete();

        match route.reply {
            Reply::Json(body) => Ok(body.into_bytes()),
            Reply::Status(status) => Err(Error::HttpStatus {
                url,
                status,
                reason: String::new(),
            }),
            Reply::Empty => Err(Error::EmptyBody { url }),
            Reply::Panic => panic!("mock transport asked to panic for {path}"),
        }
    }
}

/// Posts JSON for `(id, author_id)` pairs
pub(crate) fn posts_json(posts: &[(i64, i64)]) -> String {
    let items: Vec<String> = posts
        .iter()
        .map(|(id, author)| format!(r#"{{"id":{id},"authorId":{author},"content":"post {id}"}}"#))
        .collect();
    format!("[{}]", items.join(","))
}

/// Comments JSON of post `post_id` for `(id, author_id)` pairs
pub(crate) fn comments_json(post_id: i64, comments: &[(i64, i64)]) -> String {
    let items: Vec<String> = comments
        .iter()
        .map(|(id, author)| {
            format!(r#"{{"id":{id},"postId":{post_id},"authorId":{author},"content":"comment {id}"}}"#)
        })
        .collect();
    format!("[{}]", items.join(","))
}
