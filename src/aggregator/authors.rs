//! Author lookups.

use crate::error::Result;
use crate::fetcher::{Fetcher, decode};
use crate::routes;
use crate::types::{Author, AuthorId};

/// Fetches single authors by id.
#[derive(Clone)]
pub struct AuthorResolver {
    fetcher: Fetcher,
}

impl AuthorResolver {
    /// Create a resolver on top of a fetcher
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// `GET /authors/{id}`; failures propagate unchanged
    pub async fn resolve_author(&self, id: AuthorId) -> Result<Author> {
        self.fetcher
            .fetch(&routes::author(id), decode::author)
            .await
    }
}
