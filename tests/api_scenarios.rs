//! HTTP contract tests, driving the router in-process

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use campus_store::{LedgerService, Storage, api};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

fn setup() -> anyhow::Result<(Router, TempDir)> {
    let temp_dir = tempdir()?;
    let storage = Storage::open(temp_dir.path().join("api.db"))?;
    let (service, _) = LedgerService::load(storage, 0)?;
    Ok((api::router(Arc::new(service)), temp_dir))
}

async fn send(router: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    let json = serde_json::from_slice(&body)?;
    Ok((status, json))
}

async fn get(router: &Router, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
    send(router, Request::builder().uri(uri).body(Body::empty())?).await
}

async fn post(router: &Router, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())?,
    )
    .await
}

async fn post_json(router: &Router, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
    )
    .await
}

#[tokio::test]
async fn store_product_order_flow() -> anyhow::Result<()> {
    let (router, _dir) = setup()?;

    let (status, body) = post(&router, "/store/create?name=Library%20Cafe").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": "true", "store_id": 1}));

    let (status, body) = post_json(
        &router,
        "/store/product/add",
        json!({"store_id": 1, "name": "latte", "price": 3.5}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": "true", "product_id": 1001}));

    post_json(
        &router,
        "/store/product/add",
        json!({"store_id": 1, "name": "muffin", "price": 2.0}),
    )
    .await?;

    let (status, body) = get(&router, "/store?store_id=1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Library Cafe");
    assert_eq!(body["products"].as_array().map(Vec::len), Some(2));

    let (status, body) = post_json(
        &router,
        "/orders/add",
        json!({"student_id": 2024001, "store_id": 1, "product_ids": [1001, 1002]}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": "true", "id": 1}));

    let (status, body) = get(&router, "/orders?order_id=1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "order_id": 1,
            "student_id": 2024001,
            "store_id": 1,
            "product_ids": [1001, 1002],
            "total_price": 5.5,
            "paid": false,
            "done": false
        })
    );

    let (status, body) = post_json(
        &router,
        "/orders/update",
        json!({"order_id": 1, "done": true}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": "true"}));

    let (_, body) = get(&router, "/orders?order_id=1").await?;
    assert_eq!(body["paid"], false);
    assert_eq!(body["done"], true);

    let (_, body) = get(&router, "/store/orders?store_id=1&pending=true").await?;
    assert_eq!(body, json!([]));
    let (_, body) = get(&router, "/orders/student?student_id=2024001").await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    Ok(())
}

#[tokio::test]
async fn not_found_is_404_with_message() -> anyhow::Result<()> {
    let (router, _dir) = setup()?;

    for uri in [
        "/store?store_id=9",
        "/product?product_id=9001",
        "/orders?order_id=1",
        "/store/product?store_id=9",
    ] {
        let (status, body) = get(&router, uri).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["ok"], "false");
        assert!(body["message"].is_string());
    }

    let (status, _) = post(&router, "/store/delete?store_id=9").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(&router, "/orders/update", json!({"order_id": 5, "paid": true})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn order_with_foreign_product_is_rejected() -> anyhow::Result<()> {
    let (router, _dir) = setup()?;
    post(&router, "/store/create?name=north").await?;
    post(&router, "/store/create?name=south").await?;
    post_json(
        &router,
        "/store/product/add",
        json!({"store_id": 2, "name": "soup", "price": 4.0}),
    )
    .await?;

    let (status, body) = post_json(
        &router,
        "/orders/add",
        json!({"student_id": 1, "store_id": 1, "product_ids": [2001]}),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], "false");

    let (_, body) = get(&router, "/store/orders?store_id=1").await?;
    assert_eq!(body, json!([]));

    Ok(())
}

#[tokio::test]
async fn malformed_input_is_400() -> anyhow::Result<()> {
    let (router, _dir) = setup()?;

    let (status, body) = get(&router, "/store?store_id=abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], "false");

    let (status, _) = get(&router, "/orders/student").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&router, "/store/create").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&router, "/store/product/add", json!({"name": "tea"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    post(&router, "/store/create?name=north").await?;
    let (status, body) = post_json(
        &router,
        "/store/product/add",
        json!({"store_id": 1, "name": "tea", "price": -2.0}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some_and(|m| m.contains("price")));

    Ok(())
}

#[tokio::test]
async fn remove_product_then_lookup() -> anyhow::Result<()> {
    let (router, _dir) = setup()?;
    post(&router, "/store/create?name=north").await?;
    post_json(
        &router,
        "/store/product/add",
        json!({"store_id": 1, "name": "tea", "price": 1.0}),
    )
    .await?;

    let (status, body) = get(&router, "/product?product_id=1001").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"product_id": 1001, "store_id": 1, "name": "tea", "price": 1.0})
    );

    let (status, body) = post(&router, "/store/product/remove?product_id=1001").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": "true"}));

    let (status, _) = get(&router, "/product?product_id=1001").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = get(&router, "/store/product?store_id=1").await?;
    assert_eq!(body, json!([]));

    Ok(())
}
