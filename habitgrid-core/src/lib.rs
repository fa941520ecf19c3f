//! # habitgrid-core
//!
//! Core library for habitgrid - a personal habit tracker.
//!
//! This library provides:
//! - Domain types for goals and daily records
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//! - The relative-performance analytics engine
//!
//! ## Architecture
//!
//! Data flows through two layers:
//! - **Stored:** Goals and one record per (goal, day) in SQLite
//! - **Derived:** Percentiles, intensity levels, streaks and the year grid,
//!   always recomputed from the stored records (see [`analytics`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use habitgrid_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use analytics::StatsService;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod types;
pub mod validation;
