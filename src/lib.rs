//! # Market Arbiter
//!
//! Peer-to-peer marketplace core: sellers list single-unit products, buyers
//! send purchase requests, sellers approve or reject them.
//!
//! The part with real invariants is arbitration:
//!
//! - approving a request sells the product, rejects every other pending
//!   request on it, and approves the same buyer's other pending requests;
//! - rejecting a request also rejects the same buyer's other pending requests
//!   on that product, and nothing else;
//! - a product is sold at most once, and all of its writes commit together.
//!
//! ## Layout
//!
//! - **Domain** - records and ids → [`domain`]
//! - **Arbitration** - pure transition rules plus the engine that commits them → [`arbitration`]
//! - **Storage** - injected collaborator with transactions → [`store`]
//! - **Services** - the market actor and the user registry actor → [`market_actor`], [`actor_framework`]
//! - **Clients** - cloneable handles → [`clients`]
//! - **System** - startup, shutdown, tracing → [`app_system`]
//!
//! ## Example Usage
//!
//! ```no_run
//! # async fn demo() -> Result<(), market_arbiter::MarketError> {
//! use market_arbiter::{MarketConfig, MarketSystem};
//! use market_arbiter::domain::{Category, ProductCreate, UserCreate};
//!
//! let system = MarketSystem::new(&MarketConfig::default());
//! let seller = system.user_client.register_user(UserCreate::new("sam", "Sam")).await?;
//! let buyer = system.user_client.register_user(UserCreate::new("bea", "Bea")).await?;
//! let seller = system.authenticate(seller.id).await?;
//! let buyer = system.authenticate(buyer.id).await?;
//!
//! let listing = ProductCreate {
//!     title: "Desk".into(),
//!     description: "Oak".into(),
//!     price: 5000,
//!     category: Category::Others,
//!     image: "desk.png".into(),
//! };
//! let product = system.market_client.create_product(seller, listing).await?;
//! let request = system.market_client.submit_request(buyer, product.id, None).await?;
//! let approval = system.market_client.approve(seller, request.id).await?;
//! assert!(approval.product.sold);
//! # Ok(())
//! # }
//! ```

pub mod actor_framework;
pub mod app_system;
pub mod arbitration;
pub mod auth;
pub mod catalog;
pub mod clients;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod market_actor;
pub mod messages;
pub mod store;
pub mod user_actor;

#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod integration_tests;

pub use app_system::{setup_tracing, MarketSystem};
pub use config::MarketConfig;
pub use error::{MarketError, MarketResult};
