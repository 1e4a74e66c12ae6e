//! visitlog - a minimal visitor telemetry collector
//!
//! Accepts client-reported interaction events over HTTP, enriches them with
//! best-effort IP geolocation, appends them to a JSON Lines log and renders
//! the log as an HTML table.
//!
//! # Architecture
//! - `api`: HTTP handlers and middleware
//! - `services`: record building, geolocation, visitor service
//! - `storage`: append-only event log
//! - `config`: static configuration
//! - `runtime`: server startup
//! - `system`: logging
//! - `utils`: IP and HTML helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
