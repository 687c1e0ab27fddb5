//! Order pricing against a single store's catalog
use super::error::LedgerError;
use super::types::{Product, ProductId, Store};

/// Sum of the unit prices of `requested`, looked up in `catalog` only.
///
/// Any ID the catalog does not contain fails the whole computation. Prices are
/// plain `f64` and are added without rounding.
pub fn total_price(catalog: &[Product], requested: &[ProductId]) -> Result<f64, ProductId> {
    requested.iter().try_fold(0.0, |total, id| {
        catalog
            .iter()
            .find(|p| p.product_id == *id)
            .map(|p| total + p.price)
            .ok_or(*id)
    })
}

/// Prices an order for `store`, mapping an unmatched ID to a ledger error.
pub fn price_order(store: &Store, requested: &[ProductId]) -> Result<f64, LedgerError> {
    total_price(&store.products, requested).map_err(|product_id| LedgerError::ProductNotInStore {
        product_id,
        store_id: store.store_id,
    })
}
