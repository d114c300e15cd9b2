//! Pure reconciliation logic: log collapsing, key parsing and snapshot diffs.

/// Mutation log collapsing and sync planning.
pub mod collapse;
/// Add/move/delete classification between two snapshots.
pub mod diff;
/// Raw key parsing and flat snapshots.
pub mod keys;
