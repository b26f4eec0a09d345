pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod forms;
pub mod listing;
pub mod notify;
pub mod routes;
pub mod session;
pub mod types;
pub mod view;
