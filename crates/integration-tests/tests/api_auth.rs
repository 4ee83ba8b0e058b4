//! Session lifecycle over the real router: register, login, cookie issue,
//! password change, logout.

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use api_adapters::router;
use integration_tests::{test_state, InMemoryForum};

fn app(forum: &std::sync::Arc<InMemoryForum>) -> Router {
    router(test_state(forum.clone()), "http://localhost:5173").unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` values on a response, reduced to `name=value`.
fn session_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next().map(str::to_string))
        .collect()
}

async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            &format!(r#"{{"username":"{username}","password":"{password}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            &format!(r#"{{"username":"{username}","password":"{password}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    session_cookies(&response).join("; ")
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let forum = InMemoryForum::new();
    let app = app(&forum);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            r#"{"username":"резидент","password":"long-enough"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            r#"{"username":"resident","password":"short"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let ok = json_request(
        "POST",
        "/api/register",
        r#"{"username":"resident","password":"long-enough"}"#,
    );
    assert_eq!(app.clone().oneshot(ok).await.unwrap().status(), StatusCode::CREATED);

    let duplicate = json_request(
        "POST",
        "/api/register",
        r#"{"username":"resident","password":"long-enough"}"#,
    );
    assert_eq!(app.clone().oneshot(duplicate).await.unwrap().status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_issues_both_session_cookies() {
    let forum = InMemoryForum::new();
    let app = app(&forum);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            r#"{"username":"resident","password":"long-enough"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            r#"{"username":"resident","password":"wrong-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            r#"{"username":"resident","password":"long-enough"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = session_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("access_token=")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=")));
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let forum = InMemoryForum::new();
    let app = app(&forum);
    let cookies = register_and_login(&app, "resident", "long-enough").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/change-password")
                .header(CONTENT_TYPE, "application/json")
                .header(COOKIE, &cookies)
                .body(Body::from(
                    r#"{"current_password":"not-it","new_password":"other-secret","confirm_password":"other-secret"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/change-password")
                .header(CONTENT_TYPE, "application/json")
                .header(COOKIE, &cookies)
                .body(Body::from(
                    r#"{"current_password":"long-enough","new_password":"other-secret","confirm_password":"other-secret"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old credential dead, new one live.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            r#"{"username":"resident","password":"long-enough"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            r#"{"username":"resident","password":"other-secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_expires_both_cookies() {
    let forum = InMemoryForum::new();
    let app = app(&forum);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/logout", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let raw: Vec<_> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(raw.len(), 2);
    for cookie in raw {
        assert!(cookie.contains("Max-Age=0"), "cookie not expired: {cookie}");
    }

    let body = body_json(response).await;
    assert_eq!(body["message"], "logout successful");
}
