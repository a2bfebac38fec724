pub mod connection;
#[cfg(test)]
pub mod mock;

pub use connection::*;
