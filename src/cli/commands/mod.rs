pub mod auth;
pub mod fetch;
pub mod navigate;
pub mod school;
