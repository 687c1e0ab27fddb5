//! Persistence adapter between the ledger and sled
//!
//! Three trees mirror the relational layout the service has always used:
//!
//! - `stores`: store id, name and the store's catalog as a JSON blob
//! - `products`: one row per product, the flat index
//! - `orders`: one row per order, flags stored as 0/1
//!
//! Rows are cbor records keyed by the big-endian entity id. A flush rewrites
//! every tree in a single transaction and drops rows for entities that no
//! longer exist. A load trusts the store blobs and repairs the flat table
//! against them.
use super::allocator::in_namespace;
use super::error::StorageError;
use super::ledger::Ledger;
use super::types::{Order, OrderId, Product, ProductId, Store, StoreId, StudentId};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Batch, Db, Transactional, Tree};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const STORES_TREE: &str = "stores";
const PRODUCTS_TREE: &str = "products";
const ORDERS_TREE: &str = "orders";

#[derive(Debug, PartialEq, minicbor::Encode, minicbor::Decode)]
struct StoreRow {
    #[n(0)]
    store_id: StoreId,
    #[n(1)]
    name: String,
    #[n(2)]
    products: String, // JSON encoded catalog
}

#[derive(Debug, PartialEq, minicbor::Encode, minicbor::Decode)]
struct OrderRow {
    #[n(0)]
    order_id: OrderId,
    #[n(1)]
    student_id: StudentId,
    #[n(2)]
    store_id: StoreId,
    #[n(3)]
    product_ids: Vec<ProductId>,
    #[n(4)]
    total_price: f64,
    #[n(5)]
    paid: u8,
    #[n(6)]
    done: u8,
}

/// What the load-time reconciliation had to repair.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Catalog products missing from the flat table.
    pub restored: usize,
    /// Flat rows whose fields disagreed with the catalog.
    pub corrected: usize,
    /// Flat rows with no owning catalog entry.
    pub dropped: usize,
    /// Catalog products discarded: duplicate IDs or outside the store namespace.
    pub rejected: usize,
}

pub struct Storage {
    instance: Arc<Db>,
    stores: Tree,
    products: Tree,
    orders: Tree,
}

impl StoreRow {
    fn from_store(store: &Store) -> Result<Self, StorageError> {
        let products =
            serde_json::to_string(&store.products).map_err(|source| StorageError::ProductBlob {
                store_id: store.store_id,
                source,
            })?;
        Ok(Self {
            store_id: store.store_id,
            name: store.name.clone(),
            products,
        })
    }
    fn into_store(self) -> Result<Store, StorageError> {
        let products =
            serde_json::from_str(&self.products).map_err(|source| StorageError::ProductBlob {
                store_id: self.store_id,
                source,
            })?;
        Ok(Store {
            store_id: self.store_id,
            name: self.name,
            products,
        })
    }
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            student_id: order.student_id,
            store_id: order.store_id,
            product_ids: order.product_ids.clone(),
            total_price: order.total_price,
            paid: u8::from(order.paid),
            done: u8::from(order.done),
        }
    }
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.order_id,
            student_id: row.student_id,
            store_id: row.store_id,
            product_ids: row.product_ids,
            total_price: row.total_price,
            paid: row.paid != 0,
            done: row.done != 0,
        }
    }
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl Storage {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::new(Arc::new(db))
    }

    /// Wrap an already opened database, creating the trees if absent.
    pub fn new(instance: Arc<Db>) -> Result<Self, StorageError> {
        let stores = instance.open_tree(STORES_TREE)?;
        let products = instance.open_tree(PRODUCTS_TREE)?;
        let orders = instance.open_tree(ORDERS_TREE)?;

        Ok(Self {
            instance,
            stores,
            products,
            orders,
        })
    }

    /// Load the ledger, reconciling the flat product table against the store blobs.
    pub fn load(&self) -> Result<(Ledger, Reconciliation), StorageError> {
        let mut stores = Vec::new();
        for entry in self.stores.iter() {
            let (_, value) = entry?;
            let row: StoreRow = minicbor::decode(&value)?;
            stores.push(row.into_store()?);
        }

        let mut flat = Vec::new();
        for entry in self.products.iter() {
            let (_, value) = entry?;
            flat.push(minicbor::decode::<Product>(&value)?);
        }

        let mut orders = Vec::new();
        for entry in self.orders.iter() {
            let (_, value) = entry?;
            let row: OrderRow = minicbor::decode(&value)?;
            orders.push(Order::from(row));
        }

        let (products, report) = reconcile(&mut stores, flat);
        info!(
            stores = stores.len(),
            products = products.len(),
            orders = orders.len(),
            "ledger loaded"
        );

        Ok((Ledger::from_parts(stores, products, orders), report))
    }

    /// Rewrite all three trees from `ledger` in one transaction, then fsync.
    pub fn flush(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let mut store_rows = Vec::with_capacity(ledger.stores().len());
        for store in ledger.stores() {
            let key = store.store_id.to_be_bytes().to_vec();
            store_rows.push((key, encode(&StoreRow::from_store(store)?)?));
        }
        let stores_batch = rewrite_batch(&self.stores, store_rows)?;

        let mut product_rows = Vec::with_capacity(ledger.products().len());
        for product in ledger.products() {
            let key = product.product_id.to_be_bytes().to_vec();
            product_rows.push((key, encode(product)?));
        }
        let products_batch = rewrite_batch(&self.products, product_rows)?;

        let mut order_rows = Vec::with_capacity(ledger.orders().len());
        for order in ledger.orders() {
            let key = order.order_id.to_be_bytes().to_vec();
            order_rows.push((key, encode(&OrderRow::from(order))?));
        }
        let orders_batch = rewrite_batch(&self.orders, order_rows)?;

        (&self.stores, &self.products, &self.orders)
            .transaction(|(stores, products, orders)| {
                stores.apply_batch(&stores_batch)?;
                products.apply_batch(&products_batch)?;
                orders.apply_batch(&orders_batch)?;
                Ok::<(), ConflictableTransactionError<sled::Error>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) | TransactionError::Storage(e) => e,
            })?;
        self.instance.flush()?;

        info!(
            stores = ledger.stores().len(),
            products = ledger.products().len(),
            orders = ledger.orders().len(),
            "ledger flushed"
        );
        Ok(())
    }
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, StorageError> {
    minicbor::to_vec(value).map_err(|e| StorageError::Encode(e.to_string()))
}

// Upserts every row and removes keys the ledger no longer holds
fn rewrite_batch(tree: &Tree, rows: Vec<(Vec<u8>, Vec<u8>)>) -> Result<Batch, StorageError> {
    let live: HashSet<&[u8]> = rows.iter().map(|(k, _)| k.as_slice()).collect();

    let mut batch = Batch::default();
    for key in tree.iter().keys() {
        let key = key?;
        if !live.contains(&*key) {
            batch.remove(key);
        }
    }
    for (key, value) in rows {
        batch.insert(key, value);
    }
    Ok(batch)
}

/// Rebuild the flat index from the store catalogs, reporting divergence.
///
/// A catalog product keeps its place only if its ID lies in the owning store's
/// namespace and no earlier catalog already holds it. Catalog order is kept so
/// the flat index lists products store by store.
fn reconcile(stores: &mut [Store], flat: Vec<Product>) -> (Vec<Product>, Reconciliation) {
    let mut report = Reconciliation::default();
    let mut rows: HashMap<ProductId, Product> =
        flat.into_iter().map(|p| (p.product_id, p)).collect();
    let mut placed: HashSet<ProductId> = HashSet::new();

    let mut products = Vec::new();
    for store in stores.iter_mut() {
        let owner = store.store_id;
        store.products.retain_mut(|product| {
            let id = product.product_id;
            if !in_namespace(owner, id) {
                warn!(
                    product_id = id,
                    owner,
                    "catalog product outside store namespace, discarding"
                );
                report.rejected += 1;
                return false;
            }
            if !placed.insert(id) {
                warn!(
                    product_id = id,
                    owner,
                    "catalog product already held by another store, discarding"
                );
                report.rejected += 1;
                return false;
            }

            let mut fixed = false;
            if product.store_id != owner {
                warn!(
                    product_id = id,
                    recorded = product.store_id,
                    owner,
                    "catalog product names the wrong store, fixing"
                );
                product.store_id = owner;
                fixed = true;
            }

            match rows.remove(&id) {
                None => {
                    warn!(
                        product_id = id,
                        "product missing from flat table, restoring from catalog"
                    );
                    report.restored += 1;
                }
                Some(row) if row != *product => {
                    warn!(
                        product_id = id,
                        "flat product row differs from catalog, using catalog"
                    );
                    report.corrected += 1;
                }
                Some(_) if fixed => report.corrected += 1,
                Some(_) => {}
            }
            products.push(product.clone());
            true
        });
    }

    for orphan in rows.keys() {
        warn!(product_id = orphan, "flat product row has no owning store, dropping");
    }
    report.dropped = rows.len();

    (products, report)
}
