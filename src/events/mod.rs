//! # Change Feed
//!
//! Real-time change notifications for the watched dispatch tables, built on
//! PostgreSQL LISTEN/NOTIFY. Database triggers publish minimal change
//! payloads; [`ChangeFeed`] decodes them and fans them out to per-table
//! broadcast subscribers.

pub mod change;
pub mod emitter;
pub mod feed;

// Re-export key types for convenience
pub use change::{ChangeEvent, ChangeOp, ChangeTable};
pub use emitter::{ChangeEmitter, DbEmitter, NoopEmitter};
pub use feed::{ChangeFeed, ChangeHandler, FeedStats};
