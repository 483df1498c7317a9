//! The market actor: catalog, arbitration and request queries behind one
//! message loop.

mod service;

pub use service::MarketService;

#[cfg(test)]
mod tests;
