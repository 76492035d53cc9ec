//! Core library surface for the blog manager TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as the tests can reuse the same pieces.

pub mod db;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer, used by `main.rs` to
/// initialize the embedded SQLite store and preload data.
pub use db::{fetch_blogs, open_default};

/// The domain type every layer exchanges.
pub use models::BlogEntry;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
