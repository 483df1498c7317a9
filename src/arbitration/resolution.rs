//! Pure transition rules for a seller's decision on one purchase request.
//!
//! Everything here works on a snapshot read before any write, so "pending"
//! always means pending immediately before the call.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Product, ProductId, PurchaseRequest, RequestId, RequestStatus};
use crate::error::{MarketError, MarketResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn resulting_status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub request_id: RequestId,
    pub from: RequestStatus,
    pub to: RequestStatus,
}

/// State read from the store before resolving a decision.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub target: &'a PurchaseRequest,
    pub product: &'a Product,
    /// Pending requests on the product, target excluded.
    pub pending_on_product: &'a [PurchaseRequest],
    /// Pending requests on the product from the target's buyer, target excluded.
    pub pending_from_buyer: &'a [PurchaseRequest],
}

/// Writes that carry out one decision. Applied as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub decision: Decision,
    pub target: Transition,
    /// Sibling transitions in request id order.
    pub cascade: Vec<Transition>,
    /// Set when the decision sells the product.
    pub sells: Option<ProductId>,
}

impl Resolution {
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        std::iter::once(&self.target).chain(self.cascade.iter())
    }
}

pub fn resolve(decision: Decision, snapshot: &Snapshot<'_>) -> MarketResult<Resolution> {
    let target = snapshot.target;
    let product = snapshot.product;

    if target.product_id != product.id {
        return Err(MarketError::conflict(format!(
            "{} does not reference {}",
            target.id, product.id
        )));
    }
    if !target.status.is_pending() {
        return Err(MarketError::conflict(format!(
            "{} is already {}",
            target.id, target.status
        )));
    }
    if decision == Decision::Approve && product.sold {
        return Err(MarketError::conflict(format!("{} is already sold", product.id)));
    }

    let outcome = decision.resulting_status();
    let mut cascade: BTreeMap<RequestId, Transition> = BTreeMap::new();

    if decision == Decision::Approve {
        for rival in pending_siblings(snapshot.pending_on_product, target) {
            cascade.insert(rival.id, transition(rival, RequestStatus::Rejected));
        }
    }

    // Same-buyer pass runs last and overrides the rejection above.
    for own in pending_siblings(snapshot.pending_from_buyer, target)
        .filter(|r| r.buyer_id == target.buyer_id)
    {
        cascade.insert(own.id, transition(own, outcome));
    }

    Ok(Resolution {
        decision,
        target: transition(target, outcome),
        cascade: cascade.into_values().collect(),
        sells: (decision == Decision::Approve).then_some(product.id),
    })
}

fn pending_siblings<'a>(
    requests: &'a [PurchaseRequest],
    target: &'a PurchaseRequest,
) -> impl Iterator<Item = &'a PurchaseRequest> {
    requests.iter().filter(move |r| {
        r.id != target.id && r.product_id == target.product_id && r.status.is_pending()
    })
}

fn transition(request: &PurchaseRequest, to: RequestStatus) -> Transition {
    Transition {
        request_id: request.id,
        from: request.status,
        to,
    }
}
