mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{disabled_rate_limit, setup_test_app};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn request_without_credentials_proceeds_as_anonymous() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
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

#[tokio::test]
async fn responses_vary_on_the_authorization_header() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let vary: Vec<_> = response.headers().get_all(header::VARY).iter().collect();
    assert!(vary.iter().any(|v| *v == "Authorization"));
}

#[tokio::test]
async fn anonymous_request_to_protected_route_is_unauthorized() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/movies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "you must be authenticated to access this resource"
    );
}

#[tokio::test]
async fn malformed_authorization_headers_are_rejected_with_a_challenge() {
    let app = setup_test_app(disabled_rate_limit());

    for value in [
        "Y3QMGX3PJ3WLRL2YRTQGQ6KRHU",          // missing scheme
        "Bearer",                              // missing value
        "Basic Y3QMGX3PJ3WLRL2YRTQGQ6KRHU",    // wrong scheme
        "Bearer Y3QMGX3PJ3WLRL2YRTQGQ6KRHU x", // extra token
        "Bearer too-short",                    // wrong value shape
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/healthcheck")
                    .header(header::AUTHORIZATION, value)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "accepted header {value:?}"
        );
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid or missing authentication token");
    }
}

#[tokio::test]
async fn malformed_token_is_rejected_even_on_unprotected_routes() {
    // Authentication runs for every route; a bad credential is an error even
    // where no permission is required.
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/healthcheck")
                .header(header::AUTHORIZATION, "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
