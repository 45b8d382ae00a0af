mod support;

use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use tokio::net::TcpListener;
use uuid::Uuid;

use support::{app_with, get_db};

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<Option<TestApp>> {
    let Some(db) = get_db().await else { return Ok(None) };
    let app = app_with(db);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(Some(TestApp { base_url }))
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

#[tokio::test]
async fn e2e_public_pages() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let c = client();

    let res = c.get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?["status"], "ok");

    let res = c.get(format!("{}/car_models/?query=&page=abc", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let doc = res.json::<serde_json::Value>().await?;
    assert_eq!(doc["car_model_list"]["number"], 1);
    assert_eq!(doc["unfiltered_fallback"], false);

    let res = c.get(format!("{}/orders/?page=last", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_register_login_and_browse_own_cars() -> anyhow::Result<()> {
    let Some(app) = start_server().await? else { return Ok(()) };
    let c = client();
    let username = format!("u{}", Uuid::new_v4().simple());
    let password = "S3curePass!";

    let res = c.post(format!("{}/accounts/register/", app.base_url))
        .form(&[("username", username.as_str()), ("password", password), ("first_name", "Ona")])
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::SEE_OTHER);

    let res = c.get(format!("{}/cars/my/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::SEE_OTHER);
    assert_eq!(res.headers()["location"], "/accounts/login/?next=/cars/my/");

    let res = c.post(format!("{}/accounts/login/", app.base_url))
        .form(&[("username", username.as_str()), ("password", password), ("next", "/cars/my/")])
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::SEE_OTHER);
    assert_eq!(res.headers()["location"], "/cars/my/");

    let res = c.post(format!("{}/car/create/", app.base_url))
        .form(&[("plate_nr", "LTU-001"), ("vin", "WVWZZZ1JZXW000001")])
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::SEE_OTHER);

    let res = c.get(format!("{}/cars/my/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let doc = res.json::<serde_json::Value>().await?;
    assert_eq!(doc["car_list"].as_array().map(Vec::len), Some(1));
    let texts: Vec<&str> = doc["messages"]
        .as_array()
        .map(|m| m.iter().filter_map(|n| n["text"].as_str()).collect())
        .unwrap_or_default();
    assert!(texts.contains(&"Car LTU-001 created."), "{:?}", texts);

    let res = c.post(format!("{}/accounts/logout/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::SEE_OTHER);
    let res = c.get(format!("{}/cars/my/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::SEE_OTHER);
    Ok(())
}
