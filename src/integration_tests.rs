#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::arbitration::ArbitrationEngine;
    use crate::auth::Caller;
    use crate::clients::UserClient;
    use crate::clock::ManualClock;
    use crate::config::MarketConfig;
    use crate::domain::{Category, ProductCreate, RequestStatus, User, UserCreate, UserId, UserPatch};
    use crate::market_actor::MarketService;
    use crate::mock_framework::{create_mock_client, expect_get};
    use crate::store::InMemoryStore;
    use crate::MarketSystem;

    fn bicycle() -> ProductCreate {
        ProductCreate {
            title: "Road bike".into(),
            description: "54cm frame".into(),
            price: 40000,
            category: Category::Others,
            image: "bike.jpg".into(),
        }
    }

    #[tokio::test]
    async fn test_purchase_flow_end_to_end() {
        let system = MarketSystem::with_store(
            &MarketConfig::default(),
            InMemoryStore::new(),
            Arc::new(ManualClock::default_time()),
        );
        let users = &system.user_client;
        let market = &system.market_client;

        // 1. Register and authenticate
        let s1 = users.register_user(UserCreate::new("s1", "Seller One")).await.unwrap();
        let b1 = users.register_user(UserCreate::new("b1", "Buyer One")).await.unwrap();
        let b2 = users.register_user(UserCreate::new("b2", "Buyer Two")).await.unwrap();
        let s1 = system.authenticate(s1.id).await.unwrap();
        let b1 = system.authenticate(b1.id).await.unwrap();
        let b2 = system.authenticate(b2.id).await.unwrap();

        // 2. List and collect competing requests
        let product = market.create_product(s1, bicycle()).await.unwrap();
        let r1 = market.submit_request(b1, product.id, None).await.unwrap();
        let r2 = market.submit_request(b2, product.id, None).await.unwrap();
        let r3 = market.submit_request(b1, product.id, None).await.unwrap();
        for r in [&r1, &r2, &r3] {
            assert_eq!(r.status, RequestStatus::Pending);
        }

        // 3. Approve R1
        let approval = market.approve(s1, r1.id).await.unwrap();
        assert_eq!(approval.request.id, r1.id);
        assert_eq!(approval.request.status, RequestStatus::Approved);
        assert!(approval.product.sold);

        // 4. Verify every sibling settled
        let incoming: HashMap<_, _> = market
            .list_requests_for_seller(s1)
            .await
            .unwrap()
            .into_iter()
            .map(|view| (view.request.id, view.request.status))
            .collect();
        assert_eq!(incoming.len(), 3);
        assert_eq!(incoming[&r1.id], RequestStatus::Approved);
        assert_eq!(incoming[&r2.id], RequestStatus::Rejected);
        assert_eq!(incoming[&r3.id], RequestStatus::Approved);

        // 5. The product is closed to new requests and further approvals
        let late = market.submit_request(b2, product.id, None).await;
        assert!(matches!(late, Err(crate::MarketError::Conflict(_))));
        let again = market.approve(s1, r2.id).await;
        assert!(matches!(again, Err(crate::MarketError::Conflict(_))));

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_renamed_seller_shows_in_listings() {
        let system = MarketSystem::new(&MarketConfig::default());
        let users = &system.user_client;

        let seller = users.register_user(UserCreate::new("s1", "Seller One")).await.unwrap();
        let duplicate = users.register_user(UserCreate::new("S1", "Impostor")).await;
        assert!(duplicate.is_err());

        let caller = system.authenticate(seller.id).await.unwrap();
        system.market_client.create_product(caller, bicycle()).await.unwrap();

        let renamed = users
            .update_user(seller.id, UserPatch { name: Some("Cycle Shop".into()) })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Cycle Shop");

        let listings = system.market_client.list_products(None).await.unwrap();
        assert_eq!(listings[0].seller.name, "Cycle Shop");

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_seller_view_resolves_buyers_through_user_registry() {
        // 1. Market service with a real store and a mocked user registry
        let (user_client_inner, mut user_rx) = create_mock_client::<User>(10);
        let user_client = UserClient::new(user_client_inner);
        let engine = ArbitrationEngine::new(
            InMemoryStore::new(),
            Arc::new(ManualClock::default_time()),
            100,
        );
        let (service, market) = MarketService::new(10, engine, user_client);
        let handle = tokio::spawn(service.run());

        let seller = Caller::authenticated(UserId::new(1));
        let buyer = Caller::authenticated(UserId::new(2));
        let product = market.create_product(seller, bicycle()).await.unwrap();
        market.submit_request(buyer, product.id, None).await.unwrap();
        market.submit_request(buyer, product.id, Some("cash".into())).await.unwrap();

        // 2. Query in background
        let query = tokio::spawn({
            let market = market.clone();
            async move { market.list_requests_for_seller(seller).await }
        });

        // 3. Exactly one lookup for the repeated buyer
        let (id, responder) = expect_get(&mut user_rx).await.expect("Expected User Get");
        assert_eq!(id, UserId::new(2));
        responder
            .send(Ok(Some(User {
                id,
                username: "b2".into(),
                name: "Buyer Two".into(),
            })))
            .unwrap();

        let views = query.await.unwrap().unwrap();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.buyer.username == "b2"));
        assert!(user_rx.try_recv().is_err());

        market.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_seller_view_fails_when_buyer_is_unknown() {
        let (user_client_inner, mut user_rx) = create_mock_client::<User>(10);
        let engine = ArbitrationEngine::new(
            InMemoryStore::new(),
            Arc::new(ManualClock::default_time()),
            100,
        );
        let (service, market) = MarketService::new(10, engine, UserClient::new(user_client_inner));
        tokio::spawn(service.run());

        let seller = Caller::authenticated(UserId::new(1));
        let product = market.create_product(seller, bicycle()).await.unwrap();
        market
            .submit_request(Caller::authenticated(UserId::new(9)), product.id, None)
            .await
            .unwrap();

        let query = tokio::spawn({
            let market = market.clone();
            async move { market.list_requests_for_seller(seller).await }
        });
        let (_, responder) = expect_get(&mut user_rx).await.expect("Expected User Get");
        responder.send(Ok(None)).unwrap();

        let result = query.await.unwrap();
        assert!(matches!(result, Err(crate::MarketError::NotFound(_))));
    }
}
