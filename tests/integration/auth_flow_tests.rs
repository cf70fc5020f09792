// ==============================
// tests/integration/auth_flow_tests.rs
// ==============================
//! End-to-end flows through the full router: cookie login/logout, the
//! admin gate, and the bearer API surface.
use crate::test_utils::{
    body_json, cookie_pair, cookie_token, get_with_cookie, json_request, seed_client, set_cookie,
    setup_router, setup_state_with, test_settings,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use docsmith_backend_lib::router::create_router;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

#[tokio::test]
async fn test_bootstrap_admin_login_sets_cookie_and_session() {
    let (app, state, _temp_dir) = setup_router().await;

    // Bootstrap account has no stored hash; the fixed provisioning
    // secret must work for it
    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "admin123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).expect("login must set the session cookie");
    assert!(cookie.starts_with("docsmith_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=86400"));

    let body = body_json(response).await;
    assert_eq!(body["email"], "admin@x.test");
    assert_eq!(body["role"], "ADMIN");

    // The session is persisted server-side with a future expiry
    let token = cookie_token(&cookie_pair(&cookie));
    let session = state.sessions.find_by_token(&token).await.unwrap();
    assert!(session.expires_at > Utc::now());
    assert_eq!(state.sessions.active_count().await, 1);
}

#[tokio::test]
async fn test_login_with_wrong_secret_is_401() {
    let (app, state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "not-the-secret"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    assert_eq!(state.sessions.active_count().await, 0);
}

#[tokio::test]
async fn test_login_with_missing_fields_is_400() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(json_request("POST", "/admin/login", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_client_role_cannot_login_to_admin_surface() {
    let (app, state, _temp_dir) = setup_router().await;
    seed_client(&state, "client@x.test", "S3cure!pass").await;

    // Correct password, wrong role: 403, distinct from bad credentials
    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "client@x.test", "secret": "S3cure!pass"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_protected_path_without_cookie_redirects() {
    let (app, state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(Request::builder().uri("/admin/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    // No session was created or touched
    assert_eq!(state.sessions.active_count().await, 0);
}

#[tokio::test]
async fn test_login_page_is_exempt_from_the_gate() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_garbage_cookie_redirects_and_clears() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(get_with_cookie("/admin/me", "docsmith_session=not-a-real-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    let cleared = set_cookie(&response).expect("stale cookie must be cleared");
    assert!(cleared.starts_with("docsmith_session=;"));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_expired_session_is_never_valid() {
    // TTL of zero: the session expires the instant it is issued
    let temp_dir = TempDir::new().unwrap();
    let mut settings = test_settings(&temp_dir);
    settings.auth.session_ttl_secs = 0;
    let (state, _temp_dir) = setup_state_with(settings, temp_dir).await;
    let app = create_router(state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "admin123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pair = cookie_pair(&set_cookie(&response).unwrap());

    // Expired and invalid are handled identically: redirect + clear
    let response = app.oneshot(get_with_cookie("/admin/me", &pair)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    let cleared = set_cookie(&response).unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_valid_cookie_with_wrong_role_is_403_and_keeps_cookie() {
    let (app, state, _temp_dir) = setup_router().await;
    let client = seed_client(&state, "client@x.test", "S3cure!pass").await;

    // A perfectly valid session whose owner lacks the required role
    let session = state.sessions.create(client.id).await;
    let pair = format!("docsmith_session={}", session.token);

    let response = app.oneshot(get_with_cookie("/admin/me", &pair)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    // The credential is valid elsewhere, so it is not destroyed
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_gate_allows_admin_through() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "admin123"}),
        ))
        .await
        .unwrap();
    let pair = cookie_pair(&set_cookie(&response).unwrap());

    let response = app.oneshot(get_with_cookie("/admin/me", &pair)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], "admin@x.test");
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
async fn test_concurrent_logins_are_independently_invalidatable() {
    let (app, _state, _temp_dir) = setup_router().await;
    let login = json!({"identifier": "admin@x.test", "secret": "admin123"});

    let first = app
        .clone()
        .oneshot(json_request("POST", "/admin/login", login.clone()))
        .await
        .unwrap();
    let second = app
        .clone()
        .oneshot(json_request("POST", "/admin/login", login))
        .await
        .unwrap();

    let first_pair = cookie_pair(&set_cookie(&first).unwrap());
    let second_pair = cookie_pair(&set_cookie(&second).unwrap());
    assert_ne!(first_pair, second_pair);

    // Logging out the first device must not affect the second
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/logout")
                .header(header::COOKIE, &first_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/admin/me", &first_pair))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.oneshot(get_with_cookie("/admin/me", &second_pair)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_with_stale_token_still_succeeds() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/logout")
                .header(header::COOKIE, "docsmith_session=long-gone")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cleared = set_cookie(&response).unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_logout_without_cookie_succeeds() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_bearer_access() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "writer@x.test", "password": "S3cure!pass", "name": "Writer"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["role"], "CLIENT");

    // Registering the same address twice fails
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "writer@x.test", "password": "S3cure!pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Exchange the credentials for a claims token
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({"identifier": "writer@x.test", "secret": "S3cure!pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "writer@x.test");
    assert_eq!(body["role"], "CLIENT");

    // A tampered token is rejected, not redirected
    let mut tampered = token;
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'x' { 'y' } else { 'x' });
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {tampered}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_route_without_bearer_is_401() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .oneshot(Request::builder().uri("/api/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_set_password_retires_bootstrap_secret() {
    let (app, _state, _temp_dir) = setup_router().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "admin123"}),
        ))
        .await
        .unwrap();
    let pair = cookie_pair(&set_cookie(&response).unwrap());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/password")
                .header(header::COOKIE, &pair)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"password": "N3w!adminpass"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The provisioning secret is dead once a real hash is stored
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "admin123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            json!({"identifier": "admin@x.test", "secret": "N3w!adminpass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
