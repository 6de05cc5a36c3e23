pub mod config;
pub mod market;
pub mod persist;
pub mod telemetry;
