//! Medora - multi-tenant hospital records service
//!
//! Serves paginated, reference-resolved listings and record writes over a
//! document store:
//! - Count-then-skip pagination on cursor-only backends
//! - Concurrent resolution of record references
//! - Tenant scoping by the acting user's hospital
//! - Atomic bed admissions and discharges

#![allow(
    clippy::large_enum_variant,      // Resolved references embed whole records
)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod request_context;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
