pub mod claims;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod lifecycle;
pub mod notify;
pub mod redirector;
pub mod routes;
pub mod session;
pub mod types;
