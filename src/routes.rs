//! Path templates of the remote API, relative to the configured base URL.

use crate::types::{AuthorId, PostId};

/// `GET /posts` -- every post
pub const POSTS: &str = "/posts";

/// `GET /posts/{id}/comments` -- comments of one post
pub fn comments(post_id: PostId) -> String {
    format!("/posts/{}/comments", post_id)
}

/// `GET /authors/{id}` -- one author
pub fn author(author_id: AuthorId) -> String {
    format!("/authors/{}", author_id)
}
