//! Thin handles over actor channels.

#[macro_use]
mod macros;

pub mod market_client;
pub mod user_client;

pub use market_client::MarketClient;
pub use user_client::UserClient;
