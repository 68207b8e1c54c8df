#![forbid(unsafe_code)]

//! Core domain model and business logic for the Sweat point economy.
//!
//! This crate provides:
//! - Domain types (workouts, actions, pools, sessions, history records)
//! - The session engine and its point ledger rules
//! - Random workout selection with injectable randomness
//! - Integrity validation and snapshot import/export
//! - Storage backends (in-memory, locked JSON file)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod dataset;
pub mod catalog;
pub mod store;
pub mod selector;
pub mod engine;
pub mod validator;
pub mod snapshot;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, Limits};
pub use dataset::DataSet;
pub use catalog::{build_default_dataset, seed_defaults};
pub use store::{FileStore, MemoryStore, Store};
pub use selector::WorkoutSelector;
pub use engine::SessionEngine;
pub use validator::{validate, ValidationReport};
pub use snapshot::{export, import, ImportMode, ImportSummary, Snapshot};
pub use report::write_session_report;
