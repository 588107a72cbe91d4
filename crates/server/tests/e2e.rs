use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use service::market::MarketSnapshot;
use tokio::net::TcpListener;

struct TestApp {
    base_url: String,
}

async fn start_server(backend: configs::Backend) -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join(format!("market_e2e_{}", uuid::Uuid::new_v4()));
    let mut cfg = configs::AppConfig::default();
    cfg.store.backend = backend;
    cfg.store.local.path = data_dir.join("market.json").to_string_lossy().into_owned();
    cfg.ui.frontend_dir = data_dir.join("frontend").to_string_lossy().into_owned();

    let app = server::startup::build_app(&cfg).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

async fn snapshot(c: &reqwest::Client, app: &TestApp) -> anyhow::Result<MarketSnapshot> {
    Ok(c.get(format!("{}/api/listings", app.base_url)).send().await?.json().await?)
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server(configs::Backend::Memory).await?;
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_form_add_then_delete_on_local_sheet() -> anyhow::Result<()> {
    let app = start_server(configs::Backend::Local).await?;
    let c = reqwest::Client::new();

    for (item, price, seller) in [("A", "1", "x"), ("B", "2", "y"), ("C", "3", "z")] {
        // redirect is followed; we land on the refreshed page
        let res = c
            .post(format!("{}/listings", app.base_url))
            .form(&[("item", item), ("price", price), ("seller", seller)])
            .send()
            .await?;
        assert_eq!(res.status(), HttpStatusCode::OK);
        assert!(res.text().await?.contains("Item added successfully!"));
    }

    let snap = snapshot(&c, &app).await?;
    let b = serde_json::to_string(&snap.entries[1])?;
    let res = c
        .post(format!("{}/listings/delete", app.base_url))
        .form(&[("selection", b.as_str())])
        .send()
        .await?;
    assert!(res.text().await?.contains("Item deleted!"));

    let items: Vec<String> = snapshot(&c, &app).await?.listings().map(|l| l.item.clone()).collect();
    assert_eq!(items, vec!["A", "C"]);

    // same stale selection again: reported, nothing else removed
    let res = c
        .post(format!("{}/listings/delete", app.base_url))
        .form(&[("selection", b.as_str())])
        .send()
        .await?;
    assert!(res.text().await?.contains("Failed to delete item"));
    assert_eq!(snapshot(&c, &app).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn e2e_api_validation_error_is_json() -> anyhow::Result<()> {
    let app = start_server(configs::Backend::Memory).await?;
    let res = reqwest::Client::new()
        .post(format!("{}/api/listings", app.base_url))
        .json(&serde_json::json!({"item": "\"\"", "price": "1", "seller": "x"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Validation Error");
    Ok(())
}
