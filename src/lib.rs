pub mod api;
pub mod config;
pub mod tasks;
pub mod vision;
