//! Custom assertions for aggregation results and events

use post_aggregator::{Event, PostWithComments, RunState};
use tokio::sync::broadcast;

/// Drain every event already sitting in `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Run states announced in `events`, in order
pub fn states(events: &[Event]) -> Vec<RunState> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::RunStateChanged { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

/// Assert the posts came back with exactly these ids, in this order
pub fn assert_post_ids(posts: &[PostWithComments], expected: &[i64]) {
    let ids: Vec<i64> = posts.iter().map(|p| p.post.id.get()).collect();
    assert_eq!(ids, expected, "post order");
}

/// Assert the comments of `post` came back with exactly these ids, in this order
pub fn assert_comment_ids(post: &PostWithComments, expected: &[i64]) {
    let ids: Vec<i64> = post
        .comments_with_author
        .iter()
        .map(|c| c.comment.id.get())
        .collect();
    assert_eq!(ids, expected, "comment order of post {}", post.post.id);
}
