pub mod agents;
pub mod auth;
pub mod chat;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod results;
pub mod routes;
pub mod state;
pub mod store;
