//! Caller identity and the capabilities derived from it.
//!
//! Authentication happens outside this crate; what arrives here is a
//! [`Caller`]. Each market operation runs one check against the product it
//! touches and receives a grant. The engine only accepts grants, so it never
//! re-derives who is calling.

use serde::Serialize;

use crate::domain::{Product, ProductId, User, UserId};
use crate::error::{MarketError, MarketResult};

/// An authenticated user acting on the marketplace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Caller {
    user_id: UserId,
}

impl Caller {
    /// Wrap an identity that the authentication layer has already verified.
    pub fn authenticated(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn from_user(user: &User) -> Self {
        Self::authenticated(user.id)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Proof that the caller owns `product_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerGrant {
    seller_id: UserId,
    product_id: ProductId,
}

impl SellerGrant {
    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// Proof that the caller may ask to buy `product_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerGrant {
    buyer_id: UserId,
    product_id: ProductId,
}

impl BuyerGrant {
    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// The caller must be the product's seller.
pub fn authorize_seller(caller: &Caller, product: &Product) -> MarketResult<SellerGrant> {
    if product.seller_id != caller.user_id {
        return Err(MarketError::forbidden(format!(
            "{} is not the seller of {}",
            caller.user_id, product.id
        )));
    }
    Ok(SellerGrant {
        seller_id: caller.user_id,
        product_id: product.id,
    })
}

/// The caller must not be the product's seller. Self-purchase is a
/// `Conflict`, not `Forbidden`.
pub fn authorize_buyer(caller: &Caller, product: &Product) -> MarketResult<BuyerGrant> {
    if product.seller_id == caller.user_id {
        return Err(MarketError::conflict("cannot request to buy your own product"));
    }
    Ok(BuyerGrant {
        buyer_id: caller.user_id,
        product_id: product.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use chrono::Utc;

    fn product_of(seller: u64) -> Product {
        Product {
            id: ProductId::new(9),
            seller_id: UserId::new(seller),
            title: "Bike".into(),
            description: "Road bike".into(),
            price: 30000,
            category: Category::Others,
            image: "bike.png".into(),
            sold: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_the_owner_gets_a_seller_grant() {
        let product = product_of(1);
        let grant = authorize_seller(&Caller::authenticated(UserId::new(1)), &product).unwrap();
        assert_eq!(grant.product_id(), product.id);

        let denied = authorize_seller(&Caller::authenticated(UserId::new(2)), &product);
        assert!(matches!(denied, Err(MarketError::Forbidden(_))));
    }

    #[test]
    fn test_owner_cannot_be_a_buyer() {
        let product = product_of(1);
        let denied = authorize_buyer(&Caller::authenticated(UserId::new(1)), &product);
        assert!(matches!(denied, Err(MarketError::Conflict(_))));

        let grant = authorize_buyer(&Caller::authenticated(UserId::new(5)), &product).unwrap();
        assert_eq!(grant.buyer_id(), UserId::new(5));
    }
}
