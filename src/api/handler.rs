//! Store, product and order handlers
//!
//! Reads take their identifiers from the query string, creates and updates
//! take JSON bodies. Extractor rejections are turned into the JSON error body.
use super::error::AppResult;
use crate::service::LedgerService;
use crate::types::{
    CreateOrderRequest, CreateProductRequest, Order, OrderId, Product, ProductId, Store, StoreId,
    StudentId, UpdateOrderRequest,
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type AppState = Arc<LedgerService>;

#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub store_id: StoreId,
}

#[derive(Debug, Deserialize)]
pub struct StoreOrdersQuery {
    pub store_id: StoreId,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    pub student_id: StudentId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCreated {
    pub ok: String,
    pub store_id: StoreId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductCreated {
    pub ok: String,
    pub product_id: ProductId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderCreated {
    pub ok: String,
    pub id: OrderId,
}

fn ack() -> Json<Ack> {
    Json(Ack { ok: "true".into() })
}

// =============================================================================
// Stores
// =============================================================================

/// GET /store?store_id=
pub async fn get_store(
    State(service): State<AppState>,
    query: Result<Query<StoreQuery>, QueryRejection>,
) -> AppResult<Json<Store>> {
    let Query(q) = query?;
    Ok(Json(service.store(q.store_id)?))
}

/// POST /store/create?name=
pub async fn create_store(
    State(service): State<AppState>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> AppResult<Json<StoreCreated>> {
    let Query(q) = query?;
    let store_id = service.create_store(&q.name)?;
    Ok(Json(StoreCreated {
        ok: "true".into(),
        store_id,
    }))
}

/// POST /store/delete?store_id=
pub async fn delete_store(
    State(service): State<AppState>,
    query: Result<Query<StoreQuery>, QueryRejection>,
) -> AppResult<Json<Ack>> {
    let Query(q) = query?;
    service.delete_store(q.store_id)?;
    Ok(ack())
}

/// GET /store/product?store_id=
pub async fn list_store_products(
    State(service): State<AppState>,
    query: Result<Query<StoreQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Product>>> {
    let Query(q) = query?;
    Ok(Json(service.products_for_store(q.store_id)?))
}

/// POST /store/product/add
pub async fn add_product(
    State(service): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> AppResult<Json<ProductCreated>> {
    let Json(req) = body?;
    let product_id = service.add_product(req.store_id, &req.name, req.price)?;
    Ok(Json(ProductCreated {
        ok: "true".into(),
        product_id,
    }))
}

/// POST /store/product/remove?product_id=
pub async fn remove_product(
    State(service): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> AppResult<Json<Ack>> {
    let Query(q) = query?;
    service.remove_product(q.product_id)?;
    Ok(ack())
}

/// GET /store/orders?store_id=[&pending=true]
pub async fn list_store_orders(
    State(service): State<AppState>,
    query: Result<Query<StoreOrdersQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Order>>> {
    let Query(q) = query?;
    Ok(Json(service.orders_for_store(q.store_id, q.pending)))
}

// =============================================================================
// Products
// =============================================================================

/// GET /product?product_id=
pub async fn get_product(
    State(service): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> AppResult<Json<Product>> {
    let Query(q) = query?;
    Ok(Json(service.product(q.product_id)?))
}

// =============================================================================
// Orders
// =============================================================================

/// GET /orders?order_id=
pub async fn get_order(
    State(service): State<AppState>,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> AppResult<Json<Order>> {
    let Query(q) = query?;
    Ok(Json(service.order(q.order_id)?))
}

/// POST /orders/add
pub async fn create_order(
    State(service): State<AppState>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<Json<OrderCreated>> {
    let Json(req) = body?;
    let order = service.create_order(req.student_id, req.store_id, &req.product_ids)?;
    Ok(Json(OrderCreated {
        ok: "true".into(),
        id: order.order_id,
    }))
}

/// POST /orders/update
pub async fn update_order(
    State(service): State<AppState>,
    body: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> AppResult<Json<Ack>> {
    let Json(req) = body?;
    service.update_order(req.order_id, req.patch)?;
    Ok(ack())
}

/// GET /orders/student?student_id=
pub async fn list_student_orders(
    State(service): State<AppState>,
    query: Result<Query<StudentQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Order>>> {
    let Query(q) = query?;
    Ok(Json(service.orders_for_student(q.student_id)))
}

