pub mod clock;
pub mod code_generator;
pub mod jwt;
pub mod password;
pub mod phone;
pub mod request;
pub mod search;

pub use clock::*;
pub use code_generator::*;
pub use jwt::*;
pub use password::*;
pub use phone::*;
pub use request::*;
pub use search::*;
