//! Conversation dispatcher.
//!
//! [`Dispatcher::handle`] is the linear pipeline at the center of the
//! gateway: resolve the session key, snapshot context, call the agent
//! under a deadline (with a single retry), then append the completed
//! turn to the context window and hand it to the persistence sink.
//!
//! The session lock is never held across the agent round trip: context
//! is snapshotted first, the agent call runs lock-free, and the append
//! re-acquires the per-key lock only briefly.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use tatami_types::error::{GatewayError, Result};
use tatami_types::event::{InboundMessage, OutboundMessage};
use tatami_types::turn::Turn;

use crate::agent::Agent;
use crate::session::SessionStore;

/// Receiver for completed turns on their way to durable storage.
///
/// `submit` is fire-and-forget: a slow or failed write must never delay
/// or fail the user-visible reply.
pub trait TurnSink: Send + Sync {
    /// Hand a completed turn off for persistence.
    fn submit(&self, turn: Turn);
}

/// Orchestrates one conversational turn end to end.
pub struct Dispatcher {
    agent: Arc<dyn Agent>,
    sessions: Arc<SessionStore>,
    sink: Arc<dyn TurnSink>,
    /// Deadline for a single agent call.
    deadline: Duration,
    /// Fixed pause before the single retry.
    retry_backoff: Duration,
}

impl Dispatcher {
    /// Build a dispatcher over the given collaborators.
    pub fn new(
        agent: Arc<dyn Agent>,
        sessions: Arc<SessionStore>,
        sink: Arc<dyn TurnSink>,
        deadline: Duration,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            agent,
            sessions,
            sink,
            deadline,
            retry_backoff,
        }
    }

    /// The session store backing this dispatcher.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Process one inbound message into an outbound reply.
    ///
    /// On agent failure the dispatch is retried once after
    /// `retry_backoff`; a second failure surfaces as
    /// [`GatewayError::UpstreamAgent`] or [`GatewayError::Timeout`] and
    /// no turn is recorded anywhere.
    pub async fn handle(&self, inbound: &InboundMessage) -> Result<OutboundMessage> {
        let session_key = inbound.session_key();
        let context = self.sessions.context(&session_key).await;

        let reply = match self.call_agent(inbound, &context).await {
            Ok(reply) => reply,
            Err(first) => {
                warn!(
                    session_key = %session_key,
                    error = %first,
                    "agent call failed, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                match self.call_agent(inbound, &context).await {
                    Ok(reply) => reply,
                    Err(second) => {
                        error!(
                            session_key = %session_key,
                            error = %second,
                            "dispatch failed after retry"
                        );
                        return Err(second);
                    }
                }
            }
        };

        let turn = Turn::from_exchange(inbound, reply.clone());
        self.sessions.append(turn.clone()).await;
        self.sink.submit(turn);

        info!(
            session_key = %session_key,
            context_turns = context.len(),
            "dispatched turn"
        );

        Ok(OutboundMessage {
            channel: inbound.channel,
            peer_id: inbound.peer_id.clone(),
            text: reply,
        })
    }

    /// One agent attempt under the configured deadline.
    async fn call_agent(&self, inbound: &InboundMessage, context: &[Turn]) -> Result<String> {
        match tokio::time::timeout(
            self.deadline,
            self.agent.reply(&inbound.text, context, inbound.channel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                operation: "agent_call".into(),
            }),
        }
    }
}
