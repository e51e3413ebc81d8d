pub mod config;
pub mod errors;
pub mod flow;
pub mod models;
pub mod service;
pub mod telemetry;
pub mod wallet;
