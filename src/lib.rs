pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod models;
pub mod relay;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
