use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::resolution::{resolve, Decision, Resolution, Snapshot};
use crate::auth::{authorize_buyer, authorize_seller, Caller, SellerGrant};
use crate::clock::Clock;
use crate::domain::{normalize_message, Approval, ProductId, PurchaseRequest, RequestId};
use crate::error::{MarketError, MarketResult};
use crate::store::{self, MarketStore, NewPurchaseRequest};

/// Owns the lifecycle of `Product::sold` and of every request's status.
///
/// The engine is not synchronized; callers must give it exclusive access for
/// the duration of each operation (the market actor does).
pub struct ArbitrationEngine<S: MarketStore> {
    store: S,
    clock: Arc<dyn Clock>,
    max_message_len: usize,
}

impl<S: MarketStore> ArbitrationEngine<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, max_message_len: usize) -> Self {
        Self {
            store,
            clock,
            max_message_len,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create a pending request from `caller` on `product_id`.
    #[instrument(skip(self, message), fields(buyer_id = %caller.user_id()))]
    pub fn submit_request(
        &mut self,
        caller: &Caller,
        product_id: ProductId,
        message: Option<String>,
    ) -> MarketResult<PurchaseRequest> {
        let product = self
            .store
            .get_product(product_id)?
            .ok_or_else(|| MarketError::not_found(product_id))?;
        if product.sold {
            warn!("Request on sold product refused");
            return Err(MarketError::conflict(format!("{} is already sold", product_id)));
        }
        let grant = authorize_buyer(caller, &product)?;
        let message = normalize_message(message, self.max_message_len)?;

        let request = self.store.insert_request(NewPurchaseRequest {
            product_id: grant.product_id(),
            buyer_id: grant.buyer_id(),
            message,
            created_at: self.clock.now(),
        })?;
        info!(request_id = %request.id, "Purchase request submitted");
        Ok(request)
    }

    /// Check once that `caller` sells the product `request_id` refers to.
    pub fn authorize_decision(&self, caller: &Caller, request_id: RequestId) -> MarketResult<SellerGrant> {
        let request = self
            .store
            .get_request(request_id)?
            .ok_or_else(|| MarketError::not_found(request_id))?;
        let product = self
            .store
            .get_product(request.product_id)?
            .ok_or_else(|| MarketError::not_found(request.product_id))?;
        authorize_seller(caller, &product)
    }

    /// Approve `request_id`, sell its product, and settle every sibling.
    #[instrument(skip(self, grant), fields(product_id = %grant.product_id()))]
    pub fn approve(&mut self, grant: &SellerGrant, request_id: RequestId) -> MarketResult<Approval> {
        let resolution = self.plan(Decision::Approve, grant, request_id)?;
        let request = self.apply(&resolution)?;
        let product = self
            .store
            .get_product(request.product_id)?
            .ok_or_else(|| MarketError::not_found(request.product_id))?;
        info!(
            cascaded = resolution.cascade.len(),
            "Purchase request approved, product sold"
        );
        Ok(Approval { request, product })
    }

    /// Reject `request_id` together with its buyer's other pending requests.
    #[instrument(skip(self, grant), fields(product_id = %grant.product_id()))]
    pub fn reject(&mut self, grant: &SellerGrant, request_id: RequestId) -> MarketResult<PurchaseRequest> {
        let resolution = self.plan(Decision::Reject, grant, request_id)?;
        let request = self.apply(&resolution)?;
        info!(cascaded = resolution.cascade.len(), "Purchase request rejected");
        Ok(request)
    }

    fn plan(
        &self,
        decision: Decision,
        grant: &SellerGrant,
        request_id: RequestId,
    ) -> MarketResult<Resolution> {
        let target = self
            .store
            .get_request(request_id)?
            .ok_or_else(|| MarketError::not_found(request_id))?;
        if target.product_id != grant.product_id() {
            return Err(MarketError::forbidden(format!(
                "grant for {} does not cover {}",
                grant.product_id(),
                request_id
            )));
        }
        let product = self
            .store
            .get_product(target.product_id)?
            .ok_or_else(|| MarketError::not_found(target.product_id))?;
        let pending_on_product = self.store.list_pending_for_product(product.id, target.id)?;
        let pending_from_buyer =
            self.store
                .list_pending_for_buyer_on_product(product.id, target.buyer_id, target.id)?;

        let resolution = resolve(
            decision,
            &Snapshot {
                target: &target,
                product: &product,
                pending_on_product: &pending_on_product,
                pending_from_buyer: &pending_from_buyer,
            },
        )?;
        debug!(?resolution, "Resolved decision");
        Ok(resolution)
    }

    fn apply(&mut self, resolution: &Resolution) -> MarketResult<PurchaseRequest> {
        store::transaction(&mut self.store, |store| {
            let request = store.set_status(resolution.target.request_id, resolution.target.to)?;
            if let Some(product_id) = resolution.sells {
                store.set_sold(product_id)?;
            }
            for transition in &resolution.cascade {
                store.set_status(transition.request_id, transition.to)?;
            }
            Ok::<_, MarketError>(request)
        })
        .inspect_err(|e| warn!(error = %e, "Decision rolled back"))
    }
}
