use tracing::{error, info, Instrument};

use market_arbiter::domain::{Category, ProductCreate, UserCreate};
use market_arbiter::{setup_tracing, MarketConfig, MarketSystem};

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = MarketConfig::from_env();
    setup_tracing(&config.log_filter);

    info!(?config, "Starting marketplace demo");
    let system = MarketSystem::new(&config);

    let result = run_scenario(&system)
        .instrument(tracing::info_span!("scenario"))
        .await;
    if let Err(e) = &result {
        error!(error = %e, "Scenario failed");
    }

    system.shutdown().await?;
    info!("Application completed successfully");
    result.map_err(|e| e.to_string())
}

/// One seller, two buyers, three competing requests, one approval.
async fn run_scenario(system: &MarketSystem) -> Result<(), market_arbiter::MarketError> {
    let users = &system.user_client;
    let market = &system.market_client;

    let seller = users.register_user(UserCreate::new("sam", "Sam Seller")).await?;
    let alice = users.register_user(UserCreate::new("alice", "Alice")).await?;
    let bob = users.register_user(UserCreate::new("bob", "Bob")).await?;

    let seller = system.authenticate(seller.id).await?;
    let alice = system.authenticate(alice.id).await?;
    let bob = system.authenticate(bob.id).await?;

    let product = market
        .create_product(
            seller,
            ProductCreate {
                title: "Mechanical keyboard".into(),
                description: "Brown switches, barely used".into(),
                price: 7500,
                category: Category::Electronics,
                image: "uploads/keyboard.jpg".into(),
            },
        )
        .await?;
    info!(product_id = %product.id, "Listed product");

    let first = market
        .submit_request(alice, product.id, Some("Can pick up today".into()))
        .await?;
    market.submit_request(bob, product.id, Some("Offering full price".into())).await?;
    market.submit_request(alice, product.id, None).await?;

    let approval = market.approve(seller, first.id).await?;
    info!(request_id = %approval.request.id, sold = approval.product.sold, "Approved");

    let incoming = market.list_requests_for_seller(seller).await?;
    let json = serde_json::to_string_pretty(&incoming)
        .map_err(|e| market_arbiter::MarketError::validation(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
