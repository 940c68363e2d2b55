mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::{unique, Api};
use reqwest::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let api = Api::anonymous().await?;

    let res = api.get("/health").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "ok");
    assert_eq!(res.data()["storage"], "memory");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let api = Api::anonymous().await?;

    let res = api.get("/").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "CropWatch API");
    assert!(res.data()["endpoints"]["crops"].is_string());
    Ok(())
}

#[tokio::test]
async fn signup_login_me_round_trip() -> Result<()> {
    let mut api = Api::anonymous().await?;
    let username = unique("u1");

    let signup = api.signup(&username, "pw1-secret").await?;
    assert_eq!(signup.status, StatusCode::CREATED, "{}", signup.body);
    assert_eq!(signup.data()["user"]["username"], username.as_str());
    assert!(signup.data()["user"].get("passwordHash").is_none());
    assert!(signup.data()["user"].get("password").is_none());

    let login = api.login(&username, "pw1-secret").await?;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    let token = login.data()["token"].as_str().expect("token").to_string();
    assert_eq!(token.split('.').count(), 3);

    api.token = Some(token);
    let me = api.get("/api/auth/me").await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["username"], username.as_str());
    assert_eq!(me.data()["email"], format!("{}@example.com", username));
    assert_eq!(me.data()["id"], signup.data()["user"]["id"]);
    Ok(())
}

#[tokio::test]
async fn sample_farmer_can_log_in() -> Result<()> {
    let api = Api::anonymous().await?;

    let login = api.login("farmer1", "password123").await?;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    assert_eq!(login.data()["user"]["fullName"], "Rajesh Kumar");
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_identical() -> Result<()> {
    let api = Api::anonymous().await?;
    let username = unique("enum");
    api.signup(&username, "right-password").await?;

    let wrong_password = api.login(&username, "wrong-password").await?;
    let unknown_user = api.login(&unique("ghost"), "wrong-password").await?;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, unknown_user.status);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.error(), "Invalid credentials");
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_is_rejected() -> Result<()> {
    let api = Api::anonymous().await?;
    let username = unique("dup");

    let first = api.signup(&username, "password").await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = api.signup(&username, "password").await?;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.code(), "ALREADY_EXISTS");
    assert_eq!(second.error(), "User already exists");
    Ok(())
}

#[tokio::test]
async fn signup_reports_every_missing_field() -> Result<()> {
    let api = Api::anonymous().await?;

    let res = api
        .post("/api/auth/signup", serde_json::json!({ "username": unique("partial") }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    let errors = &res.body["field_errors"];
    assert!(errors.get("email").is_some());
    assert!(errors.get("password").is_some());
    assert!(errors.get("fullName").is_some());
    assert!(errors.get("username").is_none());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let mut api = Api::anonymous().await?;

    let res = api.get("/api/crops").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "UNAUTHORIZED");
    assert_eq!(res.error(), "Access token required");

    api.token = Some("not.a.token".into());
    let res = api.get("/api/auth/me").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_json_404() -> Result<()> {
    let api = Api::anonymous().await?;

    let res = api.get("/api/does-not-exist").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn contact_form_accepts_messages() -> Result<()> {
    let api = Api::anonymous().await?;

    let res = api
        .post(
            "/api/contact",
            serde_json::json!({
                "name": "Asha",
                "email": "asha@example.com",
                "message": "When does the next drone batch ship?"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["message"], "Message sent successfully");

    let bad = api
        .post("/api/contact", serde_json::json!({ "name": "Asha", "email": "nope" }))
        .await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert!(bad.body["field_errors"].get("email").is_some());
    assert!(bad.body["field_errors"].get("message").is_some());
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let mut api = Api::farmer("expired").await?;
    let me = api.get("/api/auth/me").await?;
    let user_id: Uuid = me.data()["id"].as_str().unwrap_or_default().parse()?;
    let username = me.data()["username"].as_str().unwrap_or_default().to_string();

    // Correctly signed, but its one-hour lifetime ended an hour ago
    let stale = common::tokens(1)?.issue_at(user_id, &username, Utc::now() - Duration::hours(2))?;
    api.token = Some(stale);

    let res = api.get("/api/auth/me").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "Invalid or expired token");

    let fresh = common::tokens(1)?.issue(user_id, &username)?;
    api.token = Some(fresh);
    assert_eq!(api.get("/api/auth/me").await?.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn token_with_one_flipped_signature_character_is_rejected() -> Result<()> {
    let mut api = Api::farmer("flip").await?;
    let token = api.token.clone().unwrap_or_default();
    let first_sig_char = token.rfind('.').map(|i| i + 1).unwrap_or_default();

    let mut bytes = token.into_bytes();
    bytes[first_sig_char] = if bytes[first_sig_char] == b'A' { b'B' } else { b'A' };
    api.token = Some(String::from_utf8(bytes)?);

    let res = api.get("/api/auth/me").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "Invalid or expired token");
    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn server_runs_inside_the_test_process() -> Result<()> {
    common::ensure_server().await?;

    let names: Vec<String> = std::fs::read_dir("/proc/self/task")?
        .filter_map(|task| task.ok())
        .filter_map(|task| std::fs::read_to_string(task.path().join("comm")).ok())
        .map(|name| name.trim().to_string())
        .collect();
    assert!(
        names.iter().any(|name| name == common::SERVER_THREAD),
        "no {} thread among {:?}",
        common::SERVER_THREAD,
        names
    );
    Ok(())
}
