//! Nullable infrastructure for deterministic testing.
//!
//! Outside dependencies of the node (wall-clock time, event observers) sit
//! behind small seams. This crate provides test-friendly implementations
//! that return controlled values and never touch the OS.

pub mod clock;
pub mod recorder;

pub use clock::NullClock;
pub use recorder::EventRecorder;
