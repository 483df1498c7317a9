//! Storage collaborator consumed by the arbitration engine.
//!
//! The engine never reaches for a global handle; a `MarketStore` is injected
//! into it at construction. Writes issued between [`MarketStore::begin`] and
//! [`MarketStore::commit`] become visible together or, after
//! [`MarketStore::rollback`], not at all.

mod memory;

pub use memory::InMemoryStore;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::error;

use crate::domain::{
    Category, Product, ProductCreate, ProductId, ProductPatch, PurchaseRequest, RequestId,
    RequestStatus, UserId,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("row missing: {0}")]
    Missing(String),
    #[error("transaction error: {0}")]
    Transaction(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Row to insert for a new purchase request. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewPurchaseRequest {
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert for a new product. The store assigns the id and `sold = false`.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: UserId,
    pub listing: ProductCreate,
    pub created_at: DateTime<Utc>,
}

/// Run `work` inside one transaction. Any error from `work` rolls back every
/// write it made before the error is returned.
pub fn transaction<S, T, E>(store: &mut S, work: impl FnOnce(&mut S) -> Result<T, E>) -> Result<T, E>
where
    S: MarketStore + ?Sized,
    E: From<StoreError>,
{
    store.begin()?;
    match work(store) {
        Ok(value) => {
            if let Err(e) = store.commit() {
                if let Err(rollback) = store.rollback() {
                    error!(error = %rollback, "Rollback after failed commit also failed");
                }
                return Err(e.into());
            }
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = store.rollback() {
                error!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}

pub trait MarketStore: Send + Sync + 'static {
    // --- transaction scope ---

    fn begin(&mut self) -> StoreResult<()>;
    fn commit(&mut self) -> StoreResult<()>;
    fn rollback(&mut self) -> StoreResult<()>;

    // --- products ---

    fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    /// Idempotent: setting an already-sold product returns it unchanged.
    fn set_sold(&mut self, id: ProductId) -> StoreResult<Product>;
    fn insert_product(&mut self, row: NewProduct) -> StoreResult<Product>;
    fn update_product(&mut self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;
    fn delete_product(&mut self, id: ProductId) -> StoreResult<()>;
    /// Unsold first, then newest first.
    fn list_products(&self, category: Option<Category>) -> StoreResult<Vec<Product>>;
    /// Newest first.
    fn list_products_by_seller(&self, seller_id: UserId) -> StoreResult<Vec<Product>>;

    // --- purchase requests ---

    fn get_request(&self, id: RequestId) -> StoreResult<Option<PurchaseRequest>>;
    fn insert_request(&mut self, row: NewPurchaseRequest) -> StoreResult<PurchaseRequest>;
    fn set_status(&mut self, id: RequestId, status: RequestStatus) -> StoreResult<PurchaseRequest>;
    fn list_pending_for_product(
        &self,
        product_id: ProductId,
        excluding: RequestId,
    ) -> StoreResult<Vec<PurchaseRequest>>;
    fn list_pending_for_buyer_on_product(
        &self,
        product_id: ProductId,
        buyer_id: UserId,
        excluding: RequestId,
    ) -> StoreResult<Vec<PurchaseRequest>>;
    /// Newest first.
    fn list_requests_for_product(&self, product_id: ProductId) -> StoreResult<Vec<PurchaseRequest>>;
    /// Requests on any product listed by `seller_id`, newest first.
    fn list_requests_for_seller(&self, seller_id: UserId) -> StoreResult<Vec<PurchaseRequest>>;
    /// Newest first.
    fn list_requests_for_buyer(&self, buyer_id: UserId) -> StoreResult<Vec<PurchaseRequest>>;
}
