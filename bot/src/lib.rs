pub mod config;
pub mod engine;
pub mod gateway;
pub mod steam;
pub mod transport;
