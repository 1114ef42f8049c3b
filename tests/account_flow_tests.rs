// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in, onboarding and sign-out over HTTP.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{authed_request, body_json, create_test_app};

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .find(|value| value.starts_with("fitboost_token="))
        .unwrap_or_else(|| panic!("missing session cookie"))
}

#[tokio::test]
async fn test_signup_sets_cookie_and_points_to_onboarding() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(json_request(
            "/auth/signup",
            json!({"email": "New@Example.com", "password": "secret1", "name": "Asha"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    // localhost frontend, so no Secure flag
    assert!(!cookie.contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["name"], "Asha");
    assert_eq!(body["redirect_to"], "/onboarding");

    let profile = app
        .state
        .accounts
        .profile(body["user_id"].as_str().unwrap())
        .await
        .unwrap();
    assert_eq!(profile.email, "new@example.com");
    assert_eq!(profile.fitcoin_balance, 0);
    assert_eq!(profile.workout_streak, 0);
    assert!(!profile.verified);
}

#[tokio::test]
async fn test_signup_rejects_short_password_and_duplicate_email() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/signup",
            json!({"email": "a@example.com", "password": "12345", "name": "A"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let signup = json!({"email": "a@example.com", "password": "123456", "name": "A"});
    let response = app
        .router
        .clone()
        .oneshot(json_request("/auth/signup", signup.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(json_request("/auth/signup", signup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "email_taken");
}

#[tokio::test]
async fn test_login_checks_password() {
    let app = create_test_app();
    common::sign_up(&app.state, "login@example.com", "Login").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "/auth/login",
            json!({"email": "login@example.com", "password": "wrong-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_credentials");

    let response = app
        .router
        .oneshot(json_request(
            "/auth/login",
            json!({"email": " LOGIN@example.com ", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response);
}

#[tokio::test]
async fn test_onboarding_then_login_goes_to_dashboard() {
    let app = create_test_app();
    let (_, token) = common::sign_up(&app.state, "onboard@example.com", "Onboard").await;

    let response = app
        .router
        .clone()
        .oneshot(authed_request(
            "PUT",
            "/api/onboarding",
            &token,
            Some(json!({"age": 15, "weight": 55.0, "height": 160.0, "fitness_goal": "Unknown"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(authed_request(
            "PUT",
            "/api/onboarding",
            &token,
            Some(json!({"age": 29, "weight": 68.5, "height": 172.0, "fitness_goal": "Stay Active"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["needs_onboarding"], false);
    assert_eq!(body["fitness_goal"], "Stay Active");

    let response = app
        .router
        .oneshot(json_request(
            "/auth/login",
            json!({"email": "onboard@example.com", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["redirect_to"], "/dashboard");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, "fitboost_token=test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=0"));

    let body = body_json(response).await;
    assert_eq!(body["redirect_to"], "/auth");
}
