pub mod menu_repo;
pub mod order_repo;
pub mod restaurant_repo;
pub mod user_repo;

pub use menu_repo::MenuRepository;
pub use order_repo::OrderRepository;
pub use restaurant_repo::RestaurantRepository;
pub use user_repo::UserRepository;
