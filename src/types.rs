//! Core types for post-aggregator

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a post
    PostId
);
entity_id!(
    /// Identifier of a comment
    CommentId
);
entity_id!(
    /// Identifier of an author
    AuthorId
);

/// A post as returned by `GET /posts`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post identifier
    pub id: PostId,
    /// Author of the post
    pub author_id: AuthorId,
    /// Post text
    #[serde(default)]
    pub content: String,
    /// Publication time (unix seconds)
    #[serde(default)]
    pub published: i64,
    /// Whether the requesting user liked the post
    #[serde(default)]
    pub liked_by_me: bool,
    /// Like counter
    #[serde(default)]
    pub likes: i32,
}

/// A comment as returned by `GET /posts/{id}/comments`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment identifier
    pub id: CommentId,
    /// Post the comment belongs to
    pub post_id: PostId,
    /// Author of the comment
    pub author_id: AuthorId,
    /// Comment text
    #[serde(default)]
    pub content: String,
    /// Publication time (unix seconds)
    #[serde(default)]
    pub published: i64,
    /// Whether the requesting user liked the comment
    #[serde(default)]
    pub liked_by_me: bool,
    /// Like counter
    #[serde(default)]
    pub likes: i32,
}

/// An author as returned by `GET /authors/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Author identifier
    pub id: AuthorId,
    /// Display name
    pub name: String,
    /// Avatar file name
    #[serde(default)]
    pub avatar: String,
}

/// A comment together with its resolved author
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    /// The comment
    pub comment: Comment,
    /// The comment's author
    pub author: Author,
}

/// A post with its ordered comments and its own author
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithComments {
    /// The post
    pub post: Post,
    /// Comments in the order the comment listing returned them
    pub comments_with_author: Vec<CommentWithAuthor>,
    /// The post's author
    pub author: Author,
}

/// Identifier of a single aggregation run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one aggregation run
///
/// `Pending -> Running -> {Succeeded, Failed, Cancelled}`. Tasks are only
/// spawned while `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created, nothing requested yet
    Pending,
    /// Fetching and spawning sub-tasks
    Running,
    /// Every post was fully resolved
    Succeeded,
    /// A fetch failed; remaining work was cancelled
    Failed,
    /// The caller cancelled the run
    Cancelled,
}

impl RunState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Cancelled
        )
    }

    /// Whether sub-tasks may be spawned in this state
    pub fn can_spawn(&self) -> bool {
        matches!(self, RunState::Running)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match self {
            RunState::Pending => next == RunState::Running,
            RunState::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// Events emitted by the aggregator
///
/// Subscribe via [`PostAggregator::subscribe`](crate::PostAggregator::subscribe).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run moved to a new state
    RunStateChanged {
        /// The run
        run_id: RunId,
        /// The state it entered
        state: RunState,
    },

    /// The post listing was fetched
    PostsListed {
        /// The run
        run_id: RunId,
        /// Number of posts returned
        count: usize,
    },

    /// One post and everything under it was resolved
    PostResolved {
        /// The run
        run_id: RunId,
        /// The post
        post_id: PostId,
        /// Number of comments attached
        comments: usize,
    },

    /// The run failed with its first observed error
    RunFailed {
        /// The run
        run_id: RunId,
        /// Machine-readable error code
        code: String,
        /// Human-readable error message
        error: String,
    },
}
