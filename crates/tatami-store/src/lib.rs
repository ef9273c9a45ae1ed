//! Durable turn log for the gateway.
//!
//! [`TurnStore`] is the SQLite-backed append-only log of completed
//! turns, queried at read time for the admin views. [`TurnRecorder`] is
//! the background task that drains the fire-and-forget channel between
//! the dispatcher and the store, so a slow disk never delays a reply.

pub mod recorder;
pub mod store;

pub use recorder::{RecorderHandle, TurnRecorder};
pub use store::{ListChatsQuery, TurnStore};
