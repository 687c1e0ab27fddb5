use crate::types::{OrderId, ProductId, StoreId};

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("Store {0} not found")]
    StoreNotFound(StoreId),
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
    #[error("Product {product_id} is not sold by store {store_id}")]
    ProductNotInStore {
        product_id: ProductId,
        store_id: StoreId,
    },
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Store limit of {0} reached")]
    StoreLimit(u32),
    #[error("Store {0} cannot hold more products")]
    ProductLimit(StoreId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("sled failure: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("malformed product blob for store {store_id}: {source}")]
    ProductBlob {
        store_id: StoreId,
        #[source]
        source: serde_json::Error,
    },
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
