//! In-memory ledger of stores, products and orders
//!
//! A product lives in two places: its owning store's catalog and the flat
//! product index. Every operation here updates both or neither. Constraint
//! checks run before the first mutation so a failed call leaves the ledger
//! untouched.
use super::allocator::{allocate_order_id, allocate_product_id, allocate_store_id};
use super::error::LedgerError;
use super::pricing::price_order;
use super::types::{Order, OrderId, OrderPatch, Product, ProductId, Store, StoreId, StudentId};
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ledger {
    stores: Vec<Store>,
    // flat product index across all stores
    products: Vec<Product>,
    orders: Vec<Order>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a ledger from already reconciled collections.
    pub(crate) fn from_parts(stores: Vec<Store>, products: Vec<Product>, orders: Vec<Order>) -> Self {
        Self {
            stores,
            products,
            orders,
        }
    }

    pub fn create_store(&mut self, name: &str) -> Result<StoreId, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("Missing store name"));
        }
        let store_id = allocate_store_id(&self.stores)?;

        self.stores.push(Store::new(store_id, name.to_string()));
        info!(store_id, name, "store created");

        Ok(store_id)
    }

    /// Remove a store along with its products. Orders placed against it are kept.
    pub fn delete_store(&mut self, store_id: StoreId) -> Result<Store, LedgerError> {
        let idx = self
            .stores
            .iter()
            .position(|s| s.store_id == store_id)
            .ok_or(LedgerError::StoreNotFound(store_id))?;

        let store = self.stores.remove(idx);
        self.products.retain(|p| p.store_id != store_id);
        info!(
            store_id,
            products = store.products.len(),
            "store deleted with its products"
        );

        Ok(store)
    }

    pub fn add_product(
        &mut self,
        store_id: StoreId,
        name: &str,
        price: f64,
    ) -> Result<ProductId, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("Missing product name"));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(LedgerError::validation(
                "Product price must be a non-negative number",
            ));
        }

        let store = self
            .stores
            .iter_mut()
            .find(|s| s.store_id == store_id)
            .ok_or(LedgerError::StoreNotFound(store_id))?;
        let product = Product {
            product_id: allocate_product_id(store)?,
            store_id,
            name: name.to_string(),
            price,
        };

        store.products.push(product.clone());
        let product_id = product.product_id;
        self.products.push(product);

        Ok(product_id)
    }

    pub fn remove_product(&mut self, product_id: ProductId) -> Result<Product, LedgerError> {
        let (store_idx, product_idx) = self
            .stores
            .iter()
            .enumerate()
            .find_map(|(i, s)| {
                s.products
                    .iter()
                    .position(|p| p.product_id == product_id)
                    .map(|j| (i, j))
            })
            .ok_or(LedgerError::ProductNotFound(product_id))?;

        let removed = self.stores[store_idx].products.remove(product_idx);
        self.products.retain(|p| p.product_id != product_id);

        Ok(removed)
    }

    pub fn store(&self, store_id: StoreId) -> Result<&Store, LedgerError> {
        self.stores
            .iter()
            .find(|s| s.store_id == store_id)
            .ok_or(LedgerError::StoreNotFound(store_id))
    }

    /// Looks the product up through the store catalogs, which are authoritative.
    pub fn product(&self, product_id: ProductId) -> Result<&Product, LedgerError> {
        self.stores
            .iter()
            .find_map(|s| s.find_product(product_id))
            .ok_or(LedgerError::ProductNotFound(product_id))
    }

    pub fn products_for_store(&self, store_id: StoreId) -> Result<&[Product], LedgerError> {
        self.store(store_id).map(|s| s.products.as_slice())
    }

    /// Place an order. Duplicate product IDs in the request collapse to one.
    pub fn create_order(
        &mut self,
        student_id: StudentId,
        store_id: StoreId,
        product_ids: &[ProductId],
    ) -> Result<&Order, LedgerError> {
        let store = self.store(store_id)?;
        if product_ids.is_empty() {
            return Err(LedgerError::validation(
                "An order needs at least one product",
            ));
        }

        let mut requested: Vec<ProductId> = Vec::with_capacity(product_ids.len());
        for id in product_ids {
            if !requested.contains(id) {
                requested.push(*id);
            }
        }
        let total_price = price_order(store, &requested)?;

        let order = Order {
            order_id: allocate_order_id(&self.orders),
            student_id,
            store_id,
            product_ids: requested,
            total_price,
            paid: false,
            done: false,
        };
        info!(
            order_id = order.order_id,
            student_id, store_id, total_price, "order placed"
        );
        self.orders.push(order);

        Ok(&self.orders[self.orders.len() - 1])
    }

    pub fn update_order(
        &mut self,
        order_id: OrderId,
        patch: OrderPatch,
    ) -> Result<&Order, LedgerError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;
        patch.apply_to(order);

        Ok(order)
    }

    pub fn order(&self, order_id: OrderId) -> Result<&Order, LedgerError> {
        self.orders
            .iter()
            .find(|o| o.order_id == order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))
    }

    /// Orders placed against a store, optionally only those not yet done.
    pub fn orders_for_store(
        &self,
        store_id: StoreId,
        pending_only: bool,
    ) -> impl Iterator<Item = &Order> {
        self.orders
            .iter()
            .filter(move |o| o.store_id == store_id && !(pending_only && o.done))
    }

    pub fn orders_for_student(&self, student_id: StudentId) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(move |o| o.student_id == student_id)
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// The flat product index.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}
