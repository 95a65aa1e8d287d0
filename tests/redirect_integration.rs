//! Redirect integration tests.
//!
//! Drive the redirect router end to end: resolution, click counting via
//! the detached tracking task, and the named-routes-before-catch-all
//! ordering.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use linklet::models::NewLink;
use linklet::redirect::{create_redirect_router, RedirectResolver};
use linklet::storage::{LinkStore, SqliteLinkStore};
use linklet::tracker::ClickTracker;
use std::sync::Arc;
use tower::ServiceExt;

async fn create_test_store() -> Arc<dyn LinkStore> {
    let store = SqliteLinkStore::new("sqlite::memory:", 1).await.unwrap();
    store.init().await.unwrap();
    Arc::new(store)
}

fn test_router(store: &Arc<dyn LinkStore>) -> Router {
    let tracker = Arc::new(ClickTracker::new(Arc::clone(store)));
    let resolver = RedirectResolver::new(Arc::clone(store), tracker);
    create_redirect_router(resolver)
}

async fn seed(store: &Arc<dyn LinkStore>, code: &str, url: &str) -> i64 {
    store
        .create(NewLink {
            short_code: code.to_string(),
            original_url: url.to_string(),
            user_id: "tester".to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn redirects_and_counts_the_click() {
    let store = create_test_store().await;
    seed(&store, "dest1", "https://example.com/destination").await;
    let app = test_router(&store);

    let response = app
        .oneshot(Request::builder().uri("/dest1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()["location"],
        "https://example.com/destination"
    );
    assert!(
        response.headers().contains_key("x-linklet-timing-ms"),
        "timing header should be present on a served redirect"
    );

    // Tracking runs on a detached task; give it a moment to land.
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    let link = store.get_by_code("dest1").await.unwrap().unwrap();
    assert!(link.clicks >= 1, "click count should be at least 1");
    assert!(link.last_clicked_at.is_some());
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let store = create_test_store().await;
    let app = test_router(&store);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/doesnotexist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Link not found"), "got body: {body}");
    assert!(body.contains("doesnotexist"), "page names the offending code");
}

#[tokio::test]
async fn reserved_and_malformed_codes_are_not_found() {
    let store = create_test_store().await;

    for path in ["/login", "/dashboard", "/bad@code"] {
        let app = test_router(&store);
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::NOT_FOUND,
            "{path} must not resolve as a link"
        );
    }
}

#[tokio::test]
async fn named_routes_win_over_the_catch_all() {
    let store = create_test_store().await;
    // Even a stored row cannot shadow a named route: the catch-all is
    // registered last, and reserved names never validate as codes.
    seed(&store, "healthz", "https://evil.example.com").await;
    let app = test_router(&store);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("location"));

    let app = test_router(&store);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("linklet"));
}

#[tokio::test]
async fn concurrent_redirects_count_every_visit() {
    let store = create_test_store().await;
    seed(&store, "busy1", "https://example.com").await;
    let app = test_router(&store);

    let mut handles = vec![];
    for _ in 0..10 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move {
            app_clone
                .oneshot(Request::builder().uri("/busy1").body(Body::empty()).unwrap())
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    let link = store.get_by_code("busy1").await.unwrap().unwrap();
    assert_eq!(link.clicks, 10, "no concurrent click may be lost");
}

#[tokio::test]
async fn redirect_does_not_wait_for_tracking() {
    let store = create_test_store().await;
    seed(&store, "fast1", "https://example.com").await;
    let app = test_router(&store);

    // The redirect must be served even if the counter write has not
    // landed yet; the response itself never reports tracking state.
    let response = app
        .oneshot(Request::builder().uri("/fast1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}
