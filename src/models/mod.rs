pub mod catalog;
pub mod catalog_admin;
pub mod customer;
pub mod face;
pub mod loyalty;
pub mod pagination;
pub mod payment;
pub mod shopping;
pub mod staff;
pub mod user;

pub use catalog::*;
pub use catalog_admin::*;
pub use customer::*;
pub use face::*;
pub use loyalty::*;
pub use pagination::*;
pub use payment::*;
pub use shopping::*;
pub use staff::*;
pub use user::*;
