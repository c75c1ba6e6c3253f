//! Protocol message types and route paths for the calculator service

pub mod messages;
pub mod routes;

pub use messages::*;
pub use routes::*;
