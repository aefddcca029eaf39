//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the local-images core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other crate reads its settings from [`config::CoreConfig`] and logs
//! through `tracing`; this crate owns both ends of that contract.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
