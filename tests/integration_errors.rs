mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{disabled_rate_limit, setup_test_app};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "the requested resource could not be found");
}

#[tokio::test]
async fn wrong_method_on_known_route_is_a_json_405() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "the DELETE method is not supported for this resource"
    );
}

#[tokio::test]
async fn healthcheck_reports_environment_and_version() {
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

    let body = body_json(response).await;
    assert_eq!(body["status"], "available");
    assert_eq!(body["system_info"]["environment"], "test");
    assert!(body["system_info"]["version"].is_string());
}

#[tokio::test]
async fn malformed_json_body_is_a_400() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/users")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validation_failure_is_a_422_with_field_map() {
    let app = setup_test_app(disabled_rate_limit());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/users")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Alice Example",
                        "email": "not-an-email",
                        "password": "pa55word12345"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["email"], "must be a valid email address");
}
