//! Service layer API over the ledger and its storage
use super::error::{LedgerError, StorageError};
use super::ledger::Ledger;
use super::storage::{Reconciliation, Storage};
use super::types::{
    Order, OrderId, OrderPatch, Product, ProductId, Store, StoreId, StudentId,
};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{error, info};

/// Owns the ledger behind one lock. Each call is a single critical section.
pub struct LedgerService {
    ledger: RwLock<Ledger>,
    storage: Storage,
    // flush after this many mutations, 0 disables
    flush_every: u32,
    // only touched while the ledger write guard is held
    writes_since_flush: AtomicU32,
}

impl LedgerService {
    /// Load the ledger from storage. Runs before any traffic is served.
    pub fn load(storage: Storage, flush_every: u32) -> Result<(Self, Reconciliation), StorageError> {
        let (ledger, report) = storage.load()?;
        if !report.is_clean() {
            info!(?report, "flat product table repaired from store catalogs");
        }

        Ok((
            Self {
                ledger: RwLock::new(ledger),
                storage,
                flush_every,
                writes_since_flush: AtomicU32::new(0),
            },
            report,
        ))
    }

    /// Flush with the ledger quiesced. Called once traffic has drained.
    pub fn shutdown(&self) -> Result<(), StorageError> {
        let ledger = self.ledger.write();
        self.storage.flush(&ledger)?;
        self.writes_since_flush.store(0, Ordering::Relaxed);
        info!("ledger persisted on shutdown");
        Ok(())
    }

    pub fn create_store(&self, name: &str) -> Result<StoreId, LedgerError> {
        let mut ledger = self.ledger.write();
        let store_id = ledger.create_store(name)?;
        self.did_write(&ledger);
        Ok(store_id)
    }

    pub fn delete_store(&self, store_id: StoreId) -> Result<Store, LedgerError> {
        let mut ledger = self.ledger.write();
        let store = ledger.delete_store(store_id)?;
        self.did_write(&ledger);
        Ok(store)
    }

    pub fn add_product(
        &self,
        store_id: StoreId,
        name: &str,
        price: f64,
    ) -> Result<ProductId, LedgerError> {
        let mut ledger = self.ledger.write();
        let product_id = ledger.add_product(store_id, name, price)?;
        self.did_write(&ledger);
        Ok(product_id)
    }

    pub fn remove_product(&self, product_id: ProductId) -> Result<Product, LedgerError> {
        let mut ledger = self.ledger.write();
        let product = ledger.remove_product(product_id)?;
        self.did_write(&ledger);
        Ok(product)
    }

    pub fn create_order(
        &self,
        student_id: StudentId,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<Order, LedgerError> {
        let mut ledger = self.ledger.write();
        let order = ledger.create_order(student_id, store_id, product_ids)?.clone();
        self.did_write(&ledger);
        Ok(order)
    }

    pub fn update_order(&self, order_id: OrderId, patch: OrderPatch) -> Result<Order, LedgerError> {
        let mut ledger = self.ledger.write();
        let order = ledger.update_order(order_id, patch)?.clone();
        self.did_write(&ledger);
        Ok(order)
    }

    pub fn store(&self, store_id: StoreId) -> Result<Store, LedgerError> {
        self.ledger.read().store(store_id).cloned()
    }

    pub fn product(&self, product_id: ProductId) -> Result<Product, LedgerError> {
        self.ledger.read().product(product_id).cloned()
    }

    pub fn products_for_store(&self, store_id: StoreId) -> Result<Vec<Product>, LedgerError> {
        self.ledger
            .read()
            .products_for_store(store_id)
            .map(|products| products.to_vec())
    }

    pub fn order(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        self.ledger.read().order(order_id).cloned()
    }

    pub fn orders_for_store(&self, store_id: StoreId, pending_only: bool) -> Vec<Order> {
        self.ledger
            .read()
            .orders_for_store(store_id, pending_only)
            .cloned()
            .collect()
    }

    pub fn orders_for_student(&self, student_id: StudentId) -> Vec<Order> {
        self.ledger
            .read()
            .orders_for_student(student_id)
            .cloned()
            .collect()
    }

    /// A copy of the whole ledger, for inspection.
    pub fn snapshot(&self) -> Ledger {
        self.ledger.read().clone()
    }

    // Counts a mutation and flushes once the configured threshold is hit.
    // The caller still holds the write guard, so the flush sees a quiesced ledger.
    fn did_write(&self, ledger: &RwLockWriteGuard<'_, Ledger>) {
        if self.flush_every == 0 {
            return;
        }
        let writes = self.writes_since_flush.fetch_add(1, Ordering::Relaxed) + 1;
        if writes < self.flush_every {
            return;
        }

        match self.storage.flush(ledger) {
            Ok(()) => self.writes_since_flush.store(0, Ordering::Relaxed),
            Err(e) => error!(error = %e, "periodic flush failed, will retry on next write"),
        }
    }
}
