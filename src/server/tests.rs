use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::router;
use crate::test_helpers::{app_for, AUTH_PATH, DOCUMENTS_PATH};

const FRONT_END: &str = "https://app.talkbotix.dev";

fn app(server: &MockServer) -> Router {
    router(Arc::new(app_for(server)), None)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_sign_in_sets_cookie() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(format!("{AUTH_PATH}/accounts:lookup"));
        then.status(200).json_body(json!({ "users": [{ "localId": "user-1" }] }));
    });
    server.mock(|when, then| {
        when.method(POST).path(format!("{AUTH_PATH}:createSessionCookie"));
        then.status(200).json_body(json!({ "sessionCookie": "session-jwt" }));
    });

    let response = app(&server)
        .oneshot(post_json(
            "/api/sign-in",
            json!({ "email": "ada@example.com", "idToken": "id-token" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::SET_COOKIE],
        "session=session-jwt; Max-Age=604800; Path=/; HttpOnly; SameSite=Lax"
    );
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "Sign-in successful!" })
    );
}

#[tokio::test]
async fn test_failed_sign_in_sets_no_cookie() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(format!("{AUTH_PATH}/accounts:lookup"));
        then.status(200).json_body(json!({}));
    });

    let response = app(&server)
        .oneshot(post_json(
            "/api/sign-in",
            json!({ "email": "ghost@example.com", "idToken": "id-token" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let server = MockServer::start();

    let response = app(&server)
        .oneshot(post_json("/api/sign-up", json!({ "uid": "user-1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_out_expires_cookie() {
    let server = MockServer::start();

    let response = app(&server)
        .oneshot(Request::post("/api/sign-out").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session=; Max-Age=0;"));
}

#[tokio::test]
async fn test_me_reads_session_cookie() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(format!("{AUTH_PATH}/accounts:lookup"));
        then.status(200).json_body(json!({ "users": [{ "localId": "user-1" }] }));
    });
    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCUMENTS_PATH}/users/user-1"));
        then.status(200).json_body(json!({
            "name": "projects/test-project/databases/(default)/documents/users/user-1",
            "fields": {
                "name": { "stringValue": "Ada" },
                "email": { "stringValue": "ada@example.com" },
                "createdAt": { "stringValue": "2024-05-01T10:00:00.000Z" }
            }
        }));
    });
    let router = app(&server);

    let signed_in = router
        .clone()
        .oneshot(
            Request::get("/api/me")
                .header(header::COOKIE, "theme=dark; session=valid-cookie")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        body_json(signed_in).await,
        json!({
            "id": "user-1",
            "name": "Ada",
            "email": "ada@example.com",
            "createdAt": "2024-05-01T10:00:00.000Z"
        })
    );

    let signed_out = router
        .oneshot(Request::get("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(signed_out).await, Value::Null);
}

#[tokio::test]
async fn test_missing_interview_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCUMENTS_PATH}/interviews/nope"));
        then.status(404).json_body(json!({ "error": { "code": 404, "message": "Document not found" } }));
    });

    let response = app(&server)
        .oneshot(Request::get("/api/interviews/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_interview_id_cannot_escape_collection() {
    let server = MockServer::start();
    let victim = server.mock(|when, then| {
        when.method(GET).path(format!("{DOCUMENTS_PATH}/users/victim"));
        then.status(200).json_body(json!({
            "name": "projects/test-project/databases/(default)/documents/users/victim",
            "fields": { "email": { "stringValue": "victim@example.com" } }
        }));
    });

    let response = app(&server)
        .oneshot(
            Request::get("/api/interviews/..%2Fusers%2Fvictim")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    victim.assert_calls(0);
}

#[tokio::test]
async fn test_home_for_signed_out_visitor() {
    let server = MockServer::start();
    let query = server.mock(|when, then| {
        when.method(POST).path(format!("{DOCUMENTS_PATH}:runQuery"));
        then.status(200).json_body(json!([{
            "document": {
                "name": "projects/test-project/databases/(default)/documents/interviews/iv-9",
                "fields": {
                    "role": { "stringValue": "Backend Developer" },
                    "level": { "stringValue": "Senior" },
                    "type": { "stringValue": "Behavioral" },
                    "techstack": { "arrayValue": { "values": [{ "stringValue": "Rust" }] } },
                    "questions": { "arrayValue": {} },
                    "userId": { "stringValue": "user-2" },
                    "finalised": { "booleanValue": true },
                    "createdAt": { "stringValue": "2024-05-03T00:00:00.000Z" }
                }
            }
        }]));
    });

    let response = app(&server)
        .oneshot(Request::get("/api/home").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"], Value::Null);
    assert_eq!(body["latestInterviews"][0]["id"], "iv-9");
    assert_eq!(body["latestInterviews"][0]["type"], "Behavioral");
    assert_eq!(body["userInterviews"].as_array().map(Vec::len), Some(1));
    query.assert_calls(2);
}

#[tokio::test]
async fn test_reset_password_route() {
    let server = MockServer::start();
    let send = server.mock(|when, then| {
        when.method(POST)
            .path(format!("{AUTH_PATH}/accounts:sendOobCode"))
            .json_body(json!({ "requestType": "PASSWORD_RESET", "email": "ada@example.com" }));
        then.status(200).json_body(json!({ "email": "ada@example.com" }));
    });
    let router = app(&server);

    let response = router
        .clone()
        .oneshot(post_json("/api/reset-password", json!({ "email": "ada@example.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "message": "Password reset email sent successfully. Check your inbox."
        })
    );

    let malformed = router
        .oneshot(post_json("/api/reset-password", json!({ "address": "ada@example.com" })))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    send.assert_calls(1);
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let server = MockServer::start();
    let router = router(
        Arc::new(app_for(&server)),
        Some(HeaderValue::from_static(FRONT_END)),
    );

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/sign-in")
                .header(header::ORIGIN, FRONT_END)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONT_END);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_ignores_other_origins() {
    let server = MockServer::start();
    let router = router(
        Arc::new(app_for(&server)),
        Some(HeaderValue::from_static(FRONT_END)),
    );

    let response = router
        .oneshot(
            Request::get("/api/me")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
