//! Product registry operations. Only sellers touch their own listings, and
//! nothing here can write `sold`.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::auth::{authorize_seller, Caller};
use crate::domain::{Product, ProductCreate, ProductId, ProductPatch, PurchaseRequest};
use crate::error::{MarketError, MarketResult};
use crate::store::{self, MarketStore, NewProduct};

#[instrument(skip(store, listing), fields(seller_id = %caller.user_id(), title = %listing.title))]
pub fn create_product<S: MarketStore + ?Sized>(
    store: &mut S,
    caller: &Caller,
    listing: ProductCreate,
    now: DateTime<Utc>,
) -> MarketResult<Product> {
    listing.validate()?;
    let product = store.insert_product(NewProduct {
        seller_id: caller.user_id(),
        listing,
        created_at: now,
    })?;
    info!(product_id = %product.id, "Product listed");
    Ok(product)
}

#[instrument(skip(store, patch), fields(seller_id = %caller.user_id()))]
pub fn update_product<S: MarketStore + ?Sized>(
    store: &mut S,
    caller: &Caller,
    id: ProductId,
    patch: ProductPatch,
) -> MarketResult<Product> {
    let product = load_product(store, id)?;
    authorize_seller(caller, &product)?;
    patch.validate()?;
    if patch.is_empty() {
        return Ok(product);
    }
    let updated = store::transaction(store, |s| Ok::<_, MarketError>(s.update_product(id, patch)?))?;
    info!("Product updated");
    Ok(updated)
}

/// Refused once any purchase request references the product.
#[instrument(skip(store), fields(seller_id = %caller.user_id()))]
pub fn delete_product<S: MarketStore + ?Sized>(
    store: &mut S,
    caller: &Caller,
    id: ProductId,
) -> MarketResult<()> {
    let product = load_product(store, id)?;
    authorize_seller(caller, &product)?;
    let requests = store.list_requests_for_product(id)?;
    if !requests.is_empty() {
        warn!(request_count = requests.len(), "Delete refused");
        return Err(MarketError::conflict(format!(
            "{} has {} purchase request(s)",
            id,
            requests.len()
        )));
    }
    store.delete_product(id)?;
    info!("Product deleted");
    Ok(())
}

#[instrument(skip(store), fields(seller_id = %caller.user_id()))]
pub fn requests_for_product<S: MarketStore + ?Sized>(
    store: &S,
    caller: &Caller,
    id: ProductId,
) -> MarketResult<Vec<PurchaseRequest>> {
    let product = load_product(store, id)?;
    authorize_seller(caller, &product)?;
    Ok(store.list_requests_for_product(id)?)
}

pub fn load_product<S: MarketStore + ?Sized>(store: &S, id: ProductId) -> MarketResult<Product> {
    store.get_product(id)?.ok_or_else(|| MarketError::not_found(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, UserId};
    use crate::store::{InMemoryStore, NewPurchaseRequest};

    fn listing() -> ProductCreate {
        ProductCreate {
            title: "Monitor".into(),
            description: "27 inch".into(),
            price: 15000,
            category: Category::Electronics,
            image: "monitor.png".into(),
        }
    }

    fn seller() -> Caller {
        Caller::authenticated(UserId::new(1))
    }

    #[test]
    fn test_create_sets_owner_and_unsold() {
        let mut store = InMemoryStore::new();
        let product = create_product(&mut store, &seller(), listing(), Utc::now()).unwrap();
        assert_eq!(product.seller_id, UserId::new(1));
        assert!(!product.sold);
    }

    #[test]
    fn test_update_by_stranger_is_forbidden() {
        let mut store = InMemoryStore::new();
        let product = create_product(&mut store, &seller(), listing(), Utc::now()).unwrap();
        let stranger = Caller::authenticated(UserId::new(2));
        let patch = ProductPatch { price: Some(1), ..Default::default() };

        let result = update_product(&mut store, &stranger, product.id, patch.clone());
        assert!(matches!(result, Err(MarketError::Forbidden(_))));

        let updated = update_product(&mut store, &seller(), product.id, patch).unwrap();
        assert_eq!(updated.price, 1);
    }

    #[test]
    fn test_delete_refused_once_requested() {
        let mut store = InMemoryStore::new();
        let product = create_product(&mut store, &seller(), listing(), Utc::now()).unwrap();
        store
            .insert_request(NewPurchaseRequest {
                product_id: product.id,
                buyer_id: UserId::new(2),
                message: None,
                created_at: Utc::now(),
            })
            .unwrap();

        let result = delete_product(&mut store, &seller(), product.id);
        assert!(matches!(result, Err(MarketError::Conflict(_))));
        assert!(store.get_product(product.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_unrequested_product() {
        let mut store = InMemoryStore::new();
        let product = create_product(&mut store, &seller(), listing(), Utc::now()).unwrap();
        delete_product(&mut store, &seller(), product.id).unwrap();
        assert!(matches!(
            delete_product(&mut store, &seller(), product.id),
            Err(MarketError::NotFound(_))
        ));
    }
}
