//! Slot and sensor state for the SPINet smart-parking client: an injected
//! slot store, simulated live feeds, interval pollers with on-demand refresh,
//! key-value persistence and a small user directory, served over HTTP.

pub mod config;
pub mod errors;
pub mod feeds;
pub mod fixtures;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod poller;
pub mod services;
pub mod state;
pub mod worker;
