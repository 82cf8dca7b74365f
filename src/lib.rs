//! Assetflow - Event-sourced asset ledger
//!
//! This crate keeps every change to an asset as an immutable event, rebuilds
//! assets by replaying those events, and routes create/modify/delete commands
//! through a middleware-aware command bus onto a pluggable event store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
