//! Localization-key mutation tracking and reconciliation.
//!
//! Collapse a mutation log into net per-key actions:
//! ```
//! use lokalize::{
//!     core::collapse::collapse_text_mutations,
//!     mutation::TextMutation,
//!     types::Action,
//! };
//!
//! let log = vec![
//!     TextMutation::new("2024-01-01T00:00:00.000Z", Action::Add, "home.title"),
//!     TextMutation::new("2024-01-02T00:00:00.000Z", Action::Delete, "home.title"),
//! ];
//! let collapsed = collapse_text_mutations(&log);
//! assert_eq!(collapsed[0].action, Action::Delete);
//! ```
//!
//! Classify changes between two snapshots:
//! ```
//! use lokalize::core::{diff::diff_snapshots, keys::Snapshot};
//!
//! let old: Snapshot = [("home.title__@__1", "Hi")].into_iter().collect();
//! let new: Snapshot = [("home.heading__@__1", "Hi")].into_iter().collect();
//! let diff = diff_snapshots(&old, &new).expect("well-formed keys");
//! assert_eq!(diff.moved[0].old_key, "home.title");
//! ```
//!
//! Record mutations to the CSV log without ever failing the caller:
//! ```no_run
//! use lokalize::{
//!     config::LokalizeConfig,
//!     persist::{MutationLog, record_text_mutation},
//!     types::RecordedAction,
//! };
//!
//! let mut log = LokalizeConfig::default().open_log();
//! record_text_mutation(&mut log, RecordedAction::Add, "home.title");
//! let records = log.read_all().expect("read log");
//! ```
#![deny(missing_docs)]

/// Tool configuration.
pub mod config;
/// Log collapsing, key parsing and snapshot diffs.
pub mod core;
/// Document id reconciliation between datasets.
pub mod migrate;
/// Mutation record model.
pub mod mutation;
/// Mutation log store abstraction and implementations.
pub mod persist;
/// CMS reference resolution.
pub mod references;
/// Single-writer recorder runtime and events.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
