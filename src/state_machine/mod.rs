// State machine module for run lifecycle management
//
// Both dashboard mutation paths (status cycling and timestamp stamping)
// resolve through the single transition function in this module, which
// derives the target status and the timestamp effect together.

pub mod events;
pub mod states;
pub mod transition;

// Re-export main types for convenient access
pub use events::RunEvent;
pub use states::{RunStatus, RunType, TimestampField, TruckType};
pub use transition::{transition, TimestampEffect, TransitionOutcome};
