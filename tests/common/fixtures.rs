//! Mock API fixtures served by wiremock

use std::time::Duration;

use post_aggregator::{Config, PostAggregator};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix the fixtures are served under, like the real API
pub const API_PREFIX: &str = "/api/slow";

/// Configuration pointing at `server`
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.http.base_url = format!("{}{}", server.uri(), API_PREFIX);
    config
}

/// HTTP-backed aggregator pointing at `server`
pub fn aggregator_for(server: &MockServer) -> PostAggregator {
    PostAggregator::new(&config_for(server)).expect("fixture config is valid")
}

/// Post JSON as the API serves it
pub fn post(id: i64, author_id: i64) -> Value {
    json!({
        "id": id,
        "authorId": author_id,
        "content": format!("post {id}"),
        "published": 1_700_000_000,
        "likedByMe": false,
        "likes": 0
    })
}

/// Comment JSON as the API serves it
pub fn comment(id: i64, post_id: i64, author_id: i64) -> Value {
    json!({
        "id": id,
        "postId": post_id,
        "authorId": author_id,
        "content": format!("comment {id}"),
        "published": 1_700_000_000,
        "likedByMe": false,
        "likes": 0
    })
}

/// Author JSON as the API serves it
pub fn author(id: i64, name: &str) -> Value {
    json!({ "id": id, "name": name, "avatar": format!("{name}.jpg") })
}

/// Serve `body` at `route` (relative to [`API_PREFIX`]) after `delay`
pub async fn mount_json(server: &MockServer, route: &str, body: Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("{API_PREFIX}{route}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
}

/// Answer `route` with a bare status code
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("{API_PREFIX}{route}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// One post (1 by author 10) with one comment (100 by author 20)
pub async fn mount_single_post(server: &MockServer) {
    mount_json(server, "/posts", json!([post(1, 10)]), Duration::ZERO).await;
    mount_json(
        server,
        "/posts/1/comments",
        json!([comment(100, 1, 20)]),
        Duration::ZERO,
    )
    .await;
    mount_json(server, "/authors/10", author(10, "A"), Duration::ZERO).await;
    mount_json(server, "/authors/20", author(20, "B"), Duration::ZERO).await;
}

/// Paths the server has seen, without the API prefix, in arrival order
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().trim_start_matches(API_PREFIX).to_string())
        .collect()
}
