//! Explicit decoders, one per response shape.
//!
//! Each takes the request path (for error context) and the raw body.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::types::{Author, Comment, Post};

/// `GET /posts`
pub fn posts(path: &str, body: &[u8]) -> Result<Vec<Post>> {
    json(path, "post list", body)
}

/// `GET /posts/{id}/comments`
pub fn comments(path: &str, body: &[u8]) -> Result<Vec<Comment>> {
    json(path, "comment list", body)
}

/// `GET /authors/{id}`
pub fn author(path: &str, body: &[u8]) -> Result<Author> {
    json(path, "author", body)
}

fn json<T: DeserializeOwned>(path: &str, shape: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| Error::Decode {
        path: path.to_string(),
        shape,
        source,
    })
}
