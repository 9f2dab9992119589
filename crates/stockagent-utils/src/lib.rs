//! Shared utilities for stockagent
//!
//! This crate provides common functionality used across the stockagent workspace:
//! tracing setup, runtime environment detection and `.env` loading.

pub mod config;
pub mod logging;

pub use config::{Environment, load_dotenv};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
