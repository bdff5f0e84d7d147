//! latencyd library - exposes modules for testing.

pub mod config;
pub mod metrics;
pub mod routes;
pub mod server;
