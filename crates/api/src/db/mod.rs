//! Shared database schema, migrations, and query builders.
//!
//! Builders return `(sql, values)` pairs; the server binds and runs them.

pub mod content;
pub mod groups;
pub mod messaging;
pub mod migrations;
pub mod plans;
pub mod profiles;
pub mod sales;
pub mod settings;
pub mod tables;
pub mod taxonomies;
pub mod tools;
pub mod updates;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: SQL text plus its bound values.
pub type Built = (String, sea_query::Values);
