pub mod car;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
