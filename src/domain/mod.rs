pub mod ids;
pub mod user;
pub mod product;
pub mod purchase_request;
pub mod views;

pub use ids::*;
pub use user::*;
pub use product::*;
pub use purchase_request::*;
pub use views::*;
