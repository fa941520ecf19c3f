//! Database layer for habitgrid
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for goal and record queries

pub mod repo;
pub mod schema;

pub use repo::Database;
