//! # tatami-core
//!
//! The orchestration core of the tatami gateway:
//!
//! - **[`session`]** -- bounded per-session context windows
//! - **[`agent`]** -- the [`Agent`](agent::Agent) seam and its
//!   OpenAI-compatible HTTP implementation
//! - **[`dispatch`]** -- the [`Dispatcher`](dispatch::Dispatcher) that
//!   ties inbound messages, session context, the agent, and the
//!   persistence sink together

pub mod agent;
pub mod dispatch;
pub mod session;

pub use agent::{Agent, HttpAgent};
pub use dispatch::{Dispatcher, TurnSink};
pub use session::SessionStore;
