//! HTTP surface of the ledger service

pub mod error;
pub mod handler;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};
pub use handler::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(store_routes())
        .merge(order_routes())
        .route("/product", get(handler::get_product))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/store", get(handler::get_store))
        .route("/store/create", post(handler::create_store))
        .route("/store/delete", post(handler::delete_store))
        .route("/store/product", get(handler::list_store_products))
        .route("/store/product/add", post(handler::add_product))
        .route("/store/product/remove", post(handler::remove_product))
        .route("/store/orders", get(handler::list_store_orders))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(handler::get_order))
        .route("/orders/add", post(handler::create_order))
        .route("/orders/update", post(handler::update_order))
        .route("/orders/student", get(handler::list_student_orders))
}
