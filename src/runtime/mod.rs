//! Single-writer recorder task and its events.

/// Event stream types emitted by the recorder.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
