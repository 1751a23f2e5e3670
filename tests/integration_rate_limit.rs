mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use marquee::config::rate_limit::RateLimitConfig;
use tower::ServiceExt;

use common::setup_test_app;

fn strict_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        requests_per_second: 3,
        burst: 4,
    }
}

fn healthcheck_request(client_ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/v1/healthcheck")
        .header("x-forwarded-for", client_ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn burst_is_allowed_then_fifth_request_is_rejected() {
    let app = setup_test_app(strict_config());

    for i in 0..4 {
        let response = app
            .clone()
            .oneshot(healthcheck_request("192.168.1.100"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {} was limited", i + 1);
    }

    let response = app
        .oneshot(healthcheck_request("192.168.1.100"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn rejection_body_is_the_json_envelope() {
    let app = setup_test_app(RateLimitConfig {
        enabled: true,
        requests_per_second: 1,
        burst: 1,
    });

    let first = app
        .clone()
        .oneshot(healthcheck_request("10.1.1.1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(healthcheck_request("10.1.1.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let bytes = second.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "rate limit exceeded");
}

#[tokio::test]
async fn different_ips_have_separate_buckets() {
    let app = setup_test_app(RateLimitConfig {
        enabled: true,
        requests_per_second: 1,
        burst: 1,
    });

    let first = app
        .clone()
        .oneshot(healthcheck_request("10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let limited = app
        .clone()
        .oneshot(healthcheck_request("10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    let other_client = app.oneshot(healthcheck_request("10.0.0.2")).await.unwrap();
    assert_eq!(other_client.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_limiter_never_rejects() {
    let app = setup_test_app(RateLimitConfig {
        enabled: false,
        requests_per_second: 1,
        burst: 1,
    });

    for _ in 0..20 {
        // No client address at all: a disabled limiter does not even try to
        // resolve one.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/healthcheck")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn unresolvable_client_address_is_a_server_error() {
    let app = setup_test_app(strict_config());

    // No X-Forwarded-For header and no connection info on the request.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_forwarded_header_is_a_server_error() {
    let app = setup_test_app(strict_config());

    let response = app
        .oneshot(healthcheck_request("not-an-address"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
