//! HTTP outbound adapter.
//!
//! This module provides the reqwest implementation of the `Connection` port
//! and the settings it is built from.

mod config;
mod connection;

pub use config::{ConnectionSettings, SettingsError};
pub use connection::HttpConnection;
