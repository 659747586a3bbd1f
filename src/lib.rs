pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod queue_pump;
pub mod telemetry;
pub mod trigger_adapter;
