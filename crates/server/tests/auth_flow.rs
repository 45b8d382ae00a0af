mod support;

use axum::http::StatusCode;
use service::session::SessionStore;
use uuid::Uuid;

use support::*;

#[tokio::test]
async fn health_needs_no_database() -> anyhow::Result<()> {
    let app = offline_app();
    let resp = send(&app, get("/health", None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn anonymous_protected_pages_redirect_to_login() -> anyhow::Result<()> {
    let app = offline_app();
    for (path, expected) in [
        ("/orders/my/", "/accounts/login/?next=/orders/my/"),
        ("/cars/my/", "/accounts/login/?next=/cars/my/"),
        ("/car/create/", "/accounts/login/?next=/car/create/"),
    ] {
        let resp = send(&app, get(path, None)?).await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&resp), expected);
    }
    let resp = send(&app, post_form("/order/create", None, "car=x")?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/accounts/login/?next=/order/create"));
    Ok(())
}

#[tokio::test]
async fn cookieless_requests_do_not_allocate_sessions() -> anyhow::Result<()> {
    let (app, state) = offline_app_with_state();
    for _ in 0..50 {
        let resp = send(&app, get("/health", None)?).await?;
        assert!(set_cookie(&resp, "sessionid").is_none());
    }
    let resp = send(&app, get("/health", Some("sessionid=forged"))?).await?;
    assert!(set_cookie(&resp, "sessionid").is_none());
    assert!(state.sessions.is_empty());
    Ok(())
}

#[tokio::test]
async fn logout_ends_the_server_session() -> anyhow::Result<()> {
    let (app, state) = offline_app_with_state();
    let key = SessionStore::new_key();
    state.sessions.bump_visits(&key);
    let sid = format!("sessionid={}", key);

    let resp = send(&app, get("/health", Some(&sid))?).await?;
    assert!(set_cookie(&resp, "sessionid").is_none());

    let resp = send(&app, post_form("/accounts/logout/", Some(&sid), "")?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(set_cookie(&resp, "sessionid").as_deref(), Some("sessionid="));
    assert!(!state.sessions.contains(&key));
    assert!(state.sessions.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_not_found() -> anyhow::Result<()> {
    let app = offline_app();
    let resp = send(&app, get("/car/not-a-uuid/", None)?).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&app, get("/order/42/", None)?).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn register_login_logout_flow() -> anyhow::Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let app = app_with(db);
    let username = format!("u{}", Uuid::new_v4().simple());

    let body = format!("username={}&password=S3curePass&first_name=Ona&last_name=Jonaite&email=ona%40example.com", username);
    let resp = send(&app, post_form("/accounts/register/", None, &body)?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/accounts/login/");

    let body = format!("username={}&password=S3curePass&next=%2Fcars%2Fmy%2F", username);
    let resp = send(&app, post_form("/accounts/login/", None, &body)?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cars/my/");
    let token = set_cookie(&resp, "auth_token").expect("auth cookie set");

    let resp = send(&app, get("/cars/my/", Some(&token))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = json_body(resp).await?;
    assert_eq!(doc["template"], "garage/user_cars.html");
    assert_eq!(doc["user"]["username"], username.as_str());
    assert_eq!(doc["user"]["display_name"], "Ona Jonaite");

    let resp = send(&app, post_form("/accounts/logout/", Some(&token), "")?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() -> anyhow::Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let app = app_with(db);
    let username = format!("u{}", Uuid::new_v4().simple());
    let body = format!("username={}&password=StrongPass123", username);
    send(&app, post_form("/accounts/register/", None, &body)?).await?;

    let body = format!("username={}&password=wrong-pass", username);
    let resp = send(&app, post_form("/accounts/login/", None, &body)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&resp, "auth_token").is_none());
    let doc = json_body(resp).await?;
    assert!(doc["errors"]["__all__"].is_array());
    assert!(doc["form"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn register_rejects_short_password_and_duplicates() -> anyhow::Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let app = app_with(db);
    let username = format!("u{}", Uuid::new_v4().simple());

    let resp = send(&app, post_form("/accounts/register/", None, &format!("username={}&password=short", username))?).await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = format!("username={}&password=LongEnough1", username);
    let resp = send(&app, post_form("/accounts/register/", None, &body)?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let resp = send(&app, post_form("/accounts/register/", None, &body)?).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let doc = json_body(resp).await?;
    assert!(doc["errors"]["username"].is_array());
    Ok(())
}

#[tokio::test]
async fn tampered_token_counts_as_anonymous() -> anyhow::Result<()> {
    let Some(db) = get_db().await else { return Ok(()) };
    let app = app_with(db.clone());
    let u = seed_user(&db, false).await?;
    let cookie = format!("{}x", auth_cookie(&u)?);
    let resp = send(&app, get("/orders/my/", Some(&cookie))?).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    Ok(())
}
