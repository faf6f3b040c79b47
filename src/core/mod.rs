pub mod config;
pub mod fallback;
pub mod models;
