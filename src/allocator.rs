//! Identifier allocation for stores, products and orders
//!
//! Store IDs are handed out sequentially. Product IDs live in a fixed
//! namespace per store, `store_id * 1000 + 1 ..= store_id * 1000 + 999`, and are
//! gap-filling: removing a product frees its slot for the next product added to
//! the same store. Order IDs are a plain counter since orders are never deleted.
use super::error::LedgerError;
use super::types::{
    MAX_PRODUCTS_PER_STORE, MAX_STORES, Order, OrderId, PRODUCT_NAMESPACE, ProductId, Store,
    StoreId,
};
use std::collections::HashSet;

/// Next store ID, `existing count + 1`.
pub fn allocate_store_id(stores: &[Store]) -> Result<StoreId, LedgerError> {
    let count = stores.len() as u32;
    if count >= MAX_STORES {
        return Err(LedgerError::StoreLimit(MAX_STORES));
    }

    let taken: HashSet<StoreId> = stores.iter().map(|s| s.store_id).collect();
    let next = count + 1;
    if !taken.contains(&next) {
        return Ok(next);
    }

    // count + 1 can only be occupied after a deletion
    Ok((1..=MAX_STORES)
        .find(|id| !taken.contains(id))
        .unwrap_or(next))
}

/// First unused product ID in the store's namespace.
pub fn allocate_product_id(store: &Store) -> Result<ProductId, LedgerError> {
    let live = store.products.len() as u32;
    if live >= MAX_PRODUCTS_PER_STORE {
        return Err(LedgerError::ProductLimit(store.store_id));
    }

    let base = namespace_base(store.store_id);
    let used: HashSet<ProductId> = store.products.iter().map(|p| p.product_id).collect();

    // live + 1 candidates against live used IDs, so a free one always exists
    Ok((1..=live + 1)
        .map(|slot| base + slot)
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base + live + 1))
}

pub fn allocate_order_id(orders: &[Order]) -> OrderId {
    orders.len() as OrderId + 1
}

pub fn namespace_base(store_id: StoreId) -> ProductId {
    store_id * PRODUCT_NAMESPACE
}

/// Whether `product_id` falls inside the namespace owned by `store_id`.
pub fn in_namespace(store_id: StoreId, product_id: ProductId) -> bool {
    let base = namespace_base(store_id);
    product_id > base && product_id <= base + MAX_PRODUCTS_PER_STORE
}
