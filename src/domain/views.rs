//! Read-side shapes returned by listing queries.

use serde::Serialize;

use super::{Product, PurchaseRequest, User};

/// A product together with the user who listed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub seller: User,
}

/// A request as seen by the seller: which product, and who is asking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerRequestView {
    #[serde(flatten)]
    pub request: PurchaseRequest,
    pub product: Product,
    pub buyer: User,
}

/// A request as seen by the buyer: which product, and who is selling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerRequestView {
    #[serde(flatten)]
    pub request: PurchaseRequest,
    pub product: Product,
    pub seller: User,
}

/// Outcome of a successful approval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Approval {
    pub request: PurchaseRequest,
    pub product: Product,
}
