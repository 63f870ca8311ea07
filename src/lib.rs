pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod payload;
pub mod services;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod testing;
