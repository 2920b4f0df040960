pub mod auth;
pub mod order_service;

pub use auth::AuthService;
pub use order_service::OrderService;
