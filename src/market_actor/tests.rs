use std::sync::Arc;

use chrono::Duration;

use crate::app_system::MarketSystem;
use crate::auth::Caller;
use crate::clock::ManualClock;
use crate::config::MarketConfig;
use crate::domain::{
    Category, Product, ProductCreate, ProductId, ProductPatch, RequestId, RequestStatus, UserCreate, UserId,
};
use crate::error::MarketError;
use crate::store::InMemoryStore;

struct TestMarket {
    system: MarketSystem,
    clock: ManualClock,
}

impl TestMarket {
    fn start() -> Self {
        let clock = ManualClock::default_time();
        let system = MarketSystem::with_store(
            &MarketConfig::default(),
            InMemoryStore::new(),
            Arc::new(clock.clone()),
        );
        Self { system, clock }
    }

    async fn user(&self, username: &str) -> Caller {
        let user = self
            .system
            .user_client
            .register_user(UserCreate::new(username, username.to_uppercase()))
            .await
            .unwrap();
        self.system.authenticate(user.id).await.unwrap()
    }

    async fn list(&self, seller: Caller, title: &str, category: Category) -> Product {
        self.clock.advance(Duration::minutes(1));
        self.system
            .market_client
            .create_product(
                seller,
                ProductCreate {
                    title: title.into(),
                    description: format!("{} in good condition", title),
                    price: 2500,
                    category,
                    image: format!("{}.jpg", title.to_lowercase()),
                },
            )
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_approve_through_actor_settles_all_requests() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;
    let b1 = market.user("first").await;
    let b2 = market.user("second").await;
    let product = market.list(seller, "Bike", Category::Others).await;

    let r1 = client.submit_request(b1, product.id, None).await.unwrap();
    let r2 = client.submit_request(b2, product.id, None).await.unwrap();
    let r3 = client.submit_request(b1, product.id, None).await.unwrap();

    let approval = client.approve(seller, r1.id).await.unwrap();
    assert_eq!(approval.request.status, RequestStatus::Approved);
    assert!(approval.product.sold);

    let status = |id: RequestId| async move { client.get_request(id).await.unwrap().unwrap().status };
    assert_eq!(status(r2.id).await, RequestStatus::Rejected);
    assert_eq!(status(r3.id).await, RequestStatus::Approved);

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_approvals_have_one_winner() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;
    let b1 = market.user("first").await;
    let b2 = market.user("second").await;
    let product = market.list(seller, "Camera", Category::Electronics).await;

    let r1 = client.submit_request(b1, product.id, None).await.unwrap();
    let r2 = client.submit_request(b2, product.id, None).await.unwrap();

    let (a, b) = tokio::join!(client.approve(seller, r1.id), client.approve(seller, r2.id));
    let outcomes = [a, b];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(MarketError::Conflict(_)))));

    let product = client.get_product(product.id).await.unwrap().unwrap();
    assert!(product.sold);

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_only_the_seller_decides() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;
    let buyer = market.user("buyer").await;
    let product = market.list(seller, "Lamp", Category::Others).await;
    let request = client.submit_request(buyer, product.id, None).await.unwrap();

    let result = client.approve(buyer, request.id).await;
    assert!(matches!(result, Err(MarketError::Forbidden(_))));
    let result = client.reject(buyer, request.id).await;
    assert!(matches!(result, Err(MarketError::Forbidden(_))));

    let unchanged = client.get_request(request.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, RequestStatus::Pending);

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;

    let result = client.approve(seller, RequestId::new(404)).await;
    assert!(matches!(result, Err(MarketError::NotFound(_))));
    let result = client.submit_request(seller, ProductId::new(404), None).await;
    assert!(matches!(result, Err(MarketError::NotFound(_))));
    assert_eq!(client.get_product(ProductId::new(404)).await.unwrap(), None);

    let unknown = market.system.authenticate(UserId::new(404)).await;
    assert!(matches!(unknown, Err(MarketError::NotFound(_))));

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_request_views_join_users_and_products() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;
    let buyer = market.user("buyer").await;
    let product = market.list(seller, "Guitar", Category::Others).await;

    client
        .submit_request(buyer, product.id, Some("  weekend pickup?  ".into()))
        .await
        .unwrap();

    let incoming = client.list_requests_for_seller(seller).await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].buyer.username, "buyer");
    assert_eq!(incoming[0].product.id, product.id);
    assert_eq!(incoming[0].request.message.as_deref(), Some("weekend pickup?"));

    let outgoing = client.list_requests_for_buyer(buyer).await.unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].seller.username, "seller");

    assert!(client.list_requests_for_buyer(seller).await.unwrap().is_empty());

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_listing_puts_unsold_newest_first() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;
    let buyer = market.user("buyer").await;

    let old_book = market.list(seller, "Novel", Category::Books).await;
    let phone = market.list(seller, "Phone", Category::Electronics).await;
    let new_book = market.list(seller, "Atlas", Category::Books).await;

    let request = client.submit_request(buyer, new_book.id, None).await.unwrap();
    client.approve(seller, request.id).await.unwrap();

    let all: Vec<_> = client
        .list_products(None)
        .await
        .unwrap()
        .into_iter()
        .map(|listing| listing.product.id)
        .collect();
    assert_eq!(all, vec![phone.id, old_book.id, new_book.id]);

    let books = client.list_products(Some(Category::Books)).await.unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|l| l.seller.username == "seller"));

    let mine = client.list_seller_products(seller).await.unwrap();
    assert_eq!(mine.len(), 3);
    assert!(client.list_seller_products(buyer).await.unwrap().is_empty());

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_catalog_edits_are_owner_only() {
    let market = TestMarket::start();
    let client = &market.system.market_client;
    let seller = market.user("seller").await;
    let buyer = market.user("buyer").await;
    let product = market.list(seller, "Chair", Category::Others).await;

    let patch = ProductPatch {
        price: Some(1000),
        ..Default::default()
    };
    let result = client.update_product(buyer, product.id, patch.clone()).await;
    assert!(matches!(result, Err(MarketError::Forbidden(_))));
    let updated = client.update_product(seller, product.id, patch).await.unwrap();
    assert_eq!(updated.price, 1000);

    client.submit_request(buyer, product.id, None).await.unwrap();
    let result = client.delete_product(seller, product.id).await;
    assert!(matches!(result, Err(MarketError::Conflict(_))));

    let requests = client.list_requests_for_product(seller, product.id).await.unwrap();
    assert_eq!(requests.len(), 1);
    let result = client.list_requests_for_product(buyer, product.id).await;
    assert!(matches!(result, Err(MarketError::Forbidden(_))));

    let spare = market.list(seller, "Stool", Category::Others).await;
    client.delete_product(seller, spare.id).await.unwrap();
    assert_eq!(client.get_product(spare.id).await.unwrap(), None);

    market.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_client_fails_after_shutdown() {
    let market = TestMarket::start();
    let client = market.system.market_client.clone();
    let seller = market.user("seller").await;

    market.system.shutdown().await.unwrap();

    let result = client.list_seller_products(seller).await;
    assert!(matches!(result, Err(MarketError::ActorCommunicationError(_))));
}
