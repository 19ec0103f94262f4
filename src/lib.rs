pub mod app;
pub mod auth;
pub mod cdn;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod security;
pub mod services;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;
