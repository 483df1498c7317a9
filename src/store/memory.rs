use std::cmp::Reverse;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{MarketStore, NewProduct, NewPurchaseRequest, StoreError, StoreResult};
use crate::domain::{
    Category, Product, ProductId, ProductPatch, PurchaseRequest, RequestId, RequestStatus, UserId,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    requests: BTreeMap<RequestId, PurchaseRequest>,
    next_product_id: u64,
    next_request_id: u64,
}

/// Transactional in-memory store.
///
/// `begin` snapshots every table; `rollback` restores the snapshot and
/// `commit` discards it. Only one transaction may be open at a time, which
/// matches the single-owner actor that drives it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
    writes_before_failure: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection: the write after the next `writes` succeeding writes fails
    /// with `StoreError::Unavailable`. Used to exercise rollback paths.
    pub fn inject_write_failure_after(&mut self, writes: usize) {
        self.writes_before_failure = Some(writes);
    }

    fn check_write(&mut self) -> StoreResult<()> {
        match self.writes_before_failure.as_mut() {
            Some(0) => {
                self.writes_before_failure = None;
                warn!("Injected store write failure");
                Err(StoreError::Unavailable("injected write failure".to_string()))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn newest_first(mut requests: Vec<PurchaseRequest>) -> Vec<PurchaseRequest> {
        requests.sort_by_key(|r| Reverse((r.created_at, r.id)));
        requests
    }

    fn pending_where(
        &self,
        excluding: RequestId,
        keep: impl Fn(&PurchaseRequest) -> bool,
    ) -> Vec<PurchaseRequest> {
        self.tables
            .requests
            .values()
            .filter(|r| r.id != excluding && r.status.is_pending() && keep(r))
            .cloned()
            .collect()
    }
}

impl MarketStore for InMemoryStore {
    fn begin(&mut self) -> StoreResult<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction("transaction already open".to_string()));
        }
        self.snapshot = Some(self.tables.clone());
        debug!("Transaction opened");
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.snapshot
            .take()
            .map(|_| debug!("Transaction committed"))
            .ok_or_else(|| StoreError::Transaction("commit without open transaction".to_string()))
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let snapshot = self.snapshot.take().ok_or_else(|| {
            StoreError::Transaction("rollback without open transaction".to_string())
        })?;
        self.tables = snapshot;
        debug!("Transaction rolled back");
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.tables.products.get(&id).cloned())
    }

    fn set_sold(&mut self, id: ProductId) -> StoreResult<Product> {
        self.check_write()?;
        let product = self
            .tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        product.sold = true;
        Ok(product.clone())
    }

    fn insert_product(&mut self, row: NewProduct) -> StoreResult<Product> {
        self.check_write()?;
        self.tables.next_product_id += 1;
        let id = ProductId::new(self.tables.next_product_id);
        let listing = row.listing;
        let product = Product {
            id,
            seller_id: row.seller_id,
            title: listing.title.trim().to_string(),
            description: listing.description.trim().to_string(),
            price: listing.price,
            category: listing.category,
            image: listing.image,
            sold: false,
            created_at: row.created_at,
        };
        self.tables.products.insert(id, product.clone());
        Ok(product)
    }

    fn update_product(&mut self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        self.check_write()?;
        let product = self
            .tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        product.apply_patch(patch);
        Ok(product.clone())
    }

    fn delete_product(&mut self, id: ProductId) -> StoreResult<()> {
        self.check_write()?;
        self.tables
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::Missing(id.to_string()))
    }

    fn list_products(&self, category: Option<Category>) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .tables
            .products
            .values()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.sold, Reverse((p.created_at, p.id))));
        Ok(products)
    }

    fn list_products_by_seller(&self, seller_id: UserId) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .tables
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| Reverse((p.created_at, p.id)));
        Ok(products)
    }

    fn get_request(&self, id: RequestId) -> StoreResult<Option<PurchaseRequest>> {
        Ok(self.tables.requests.get(&id).cloned())
    }

    fn insert_request(&mut self, row: NewPurchaseRequest) -> StoreResult<PurchaseRequest> {
        self.check_write()?;
        self.tables.next_request_id += 1;
        let request = PurchaseRequest {
            id: RequestId::new(self.tables.next_request_id),
            product_id: row.product_id,
            buyer_id: row.buyer_id,
            status: RequestStatus::Pending,
            message: row.message,
            created_at: row.created_at,
        };
        self.tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    fn set_status(&mut self, id: RequestId, status: RequestStatus) -> StoreResult<PurchaseRequest> {
        self.check_write()?;
        let request = self
            .tables
            .requests
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        request.status = status;
        Ok(request.clone())
    }

    fn list_pending_for_product(
        &self,
        product_id: ProductId,
        excluding: RequestId,
    ) -> StoreResult<Vec<PurchaseRequest>> {
        Ok(self.pending_where(excluding, |r| r.product_id == product_id))
    }

    fn list_pending_for_buyer_on_product(
        &self,
        product_id: ProductId,
        buyer_id: UserId,
        excluding: RequestId,
    ) -> StoreResult<Vec<PurchaseRequest>> {
        Ok(self.pending_where(excluding, |r| {
            r.product_id == product_id && r.buyer_id == buyer_id
        }))
    }

    fn list_requests_for_product(&self, product_id: ProductId) -> StoreResult<Vec<PurchaseRequest>> {
        let requests = self
            .tables
            .requests
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(requests))
    }

    fn list_requests_for_seller(&self, seller_id: UserId) -> StoreResult<Vec<PurchaseRequest>> {
        let products = &self.tables.products;
        let requests = self
            .tables
            .requests
            .values()
            .filter(|r| {
                products
                    .get(&r.product_id)
                    .is_some_and(|p| p.seller_id == seller_id)
            })
            .cloned()
            .collect();
        Ok(Self::newest_first(requests))
    }

    fn list_requests_for_buyer(&self, buyer_id: UserId) -> StoreResult<Vec<PurchaseRequest>> {
        let requests = self
            .tables
            .requests
            .values()
            .filter(|r| r.buyer_id == buyer_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(requests))
    }
}
