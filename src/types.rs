//! Ledger entities and the request/response shapes of the HTTP surface
use serde::{Deserialize, Serialize};

pub type StoreId = u32;
pub type ProductId = u32;
pub type OrderId = u64;
pub type StudentId = i64;

/// Upper bound on live stores.
pub const MAX_STORES: u32 = 1000;
/// Width of a store's product ID namespace; slot 0 is never handed out.
pub const PRODUCT_NAMESPACE: u32 = 1000;
pub const MAX_PRODUCTS_PER_STORE: u32 = PRODUCT_NAMESPACE - 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: StoreId,
    pub name: String,
    pub products: Vec<Product>,
}

// The product table row is this struct encoded into cbor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct Product {
    #[n(0)]
    pub product_id: ProductId,
    // Derivable from product_id / 1000 but kept explicit for lookups
    #[n(1)]
    pub store_id: StoreId,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    // Opaque, not checked against anything
    pub student_id: StudentId,
    pub store_id: StoreId,
    pub product_ids: Vec<ProductId>,
    // Priced once at creation, later price edits do not touch it
    pub total_price: f64,
    pub paid: bool,
    pub done: bool,
}

/// Partial update of an order's flags. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default)]
    pub paid: Option<bool>,
    #[serde(default)]
    pub done: Option<bool>,
}

impl Store {
    pub fn new(store_id: StoreId, name: String) -> Self {
        Self {
            store_id,
            name,
            products: vec![],
        }
    }
    pub fn find_product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }
}

impl OrderPatch {
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(paid) = self.paid {
            order.paid = paid;
        }
        if let Some(done) = self.done {
            order.done = done;
        }
    }
}

// Requests

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub store_id: StoreId,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub student_id: StudentId,
    pub store_id: StoreId,
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub patch: OrderPatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_without_flags_is_empty_patch() {
        let req: UpdateOrderRequest = serde_json::from_str(r#"{"order_id": 3}"#).unwrap();

        assert_eq!(req.order_id, 3);
        assert_eq!(req.patch, OrderPatch::default());
    }

    #[test]
    fn update_request_keeps_only_given_flag() {
        let req: UpdateOrderRequest =
            serde_json::from_str(r#"{"order_id": 1, "done": true}"#).unwrap();

        assert_eq!(req.patch.paid, None);
        assert_eq!(req.patch.done, Some(true));
    }
}
