pub mod auth;
pub mod customer;
pub mod face;
pub mod loyalty;
pub mod payment;
pub mod shop;
pub mod shopping;
pub mod staff;

pub use auth::auth_config;
pub use customer::customer_config;
pub use face::face_config;
pub use loyalty::loyalty_config;
pub use payment::payment_config;
pub use shop::shop_config;
pub use shopping::shopping_config;
pub use staff::staff_config;
