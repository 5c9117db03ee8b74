//! Decisions delegated to an external source.
//!
//! [`remote_pair`] creates two connected halves. The [`RemoteController`] is
//! attached to a ship inside the simulation; the [`RemoteEndpoint`] goes to
//! whatever transport talks to the remote agent. Every tick the controller
//! sends the latest snapshot and waits for a reply tagged with the same tick,
//! but never longer than its timeout. A late, missing or disconnected reply
//! yields `None`, so the ship keeps its previous command instead of stalling
//! the tick loop.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::Command;
use crate::entity::EntityId;
use crate::error::{SimError, SimResult};
use crate::snapshot::Snapshot;

use super::Controller;

/// Sent to the remote side once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Ship to decide for
    pub ship: EntityId,
    /// Tick of the snapshot; echo it in the reply
    pub tick: u64,
    /// State to decide on
    pub snapshot: Arc<Snapshot>,
}

/// The remote side's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReply {
    /// Tick of the request being answered
    pub tick: u64,
    /// Chosen command
    pub command: Command,
}

/// Create a connected controller and endpoint.
///
/// ```
/// use std::time::Duration;
/// use botfighter_core::controller::remote_pair;
///
/// let (controller, endpoint) = remote_pair("agent-1", Duration::from_millis(50));
/// assert!(endpoint.next_request(Duration::ZERO).unwrap().is_none());
/// # drop(controller);
/// ```
#[must_use]
pub fn remote_pair(name: impl Into<String>, timeout: Duration) -> (RemoteController, RemoteEndpoint) {
    let (request_tx, request_rx) = mpsc::channel();
    let (reply_tx, reply_rx) = mpsc::channel();
    let controller = RemoteController {
        name: name.into(),
        timeout,
        requests: request_tx,
        replies: reply_rx,
        disconnected: false,
    };
    let endpoint = RemoteEndpoint {
        requests: request_rx,
        replies: reply_tx,
    };
    (controller, endpoint)
}

/// Simulation-side half of a remote decision source.
#[derive(Debug)]
pub struct RemoteController {
    name: String,
    timeout: Duration,
    requests: mpsc::Sender<DecisionRequest>,
    replies: mpsc::Receiver<DecisionReply>,
    disconnected: bool,
}

impl RemoteController {
    /// Longest time a decision may take.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn mark_disconnected(&mut self) {
        if !self.disconnected {
            warn!(controller = %self.name, "remote decision source disconnected");
            self.disconnected = true;
        }
    }
}

impl Controller for RemoteController {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, ship: EntityId, snapshot: &Arc<Snapshot>) -> Option<Command> {
        let tick = snapshot.tick;
        let request = DecisionRequest {
            ship,
            tick,
            snapshot: Arc::clone(snapshot),
        };
        if self.requests.send(request).is_err() {
            self.mark_disconnected();
            return None;
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok(reply) if reply.tick == tick => return Some(reply.command),
                Ok(reply) => {
                    debug!(controller = %self.name, stale = reply.tick, tick, "discarding stale reply");
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        controller = %self.name,
                        ship = %ship,
                        tick,
                        timeout_ms = self.timeout.as_millis(),
                        "remote decision timed out, keeping previous command"
                    );
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.mark_disconnected();
                    return None;
                }
            }
        }
    }
}

/// External half of a remote decision source.
#[derive(Debug)]
pub struct RemoteEndpoint {
    requests: mpsc::Receiver<DecisionRequest>,
    replies: mpsc::Sender<DecisionReply>,
}

impl RemoteEndpoint {
    /// Wait up to `timeout` for the next request.
    ///
    /// # Errors
    ///
    /// [`SimError::ChannelClosed`] once the controller has been dropped.
    pub fn next_request(&self, timeout: Duration) -> SimResult<Option<DecisionRequest>> {
        match self.requests.recv_timeout(timeout) {
            Ok(request) => Ok(Some(request)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SimError::ChannelClosed("decision requests")),
        }
    }

    /// Newest queued request, skipping any backlog.
    pub fn latest_request(&self) -> Option<DecisionRequest> {
        self.requests.try_iter().last()
    }

    /// Answer the request for `tick`.
    ///
    /// # Errors
    ///
    /// [`SimError::ChannelClosed`] once the controller has been dropped.
    pub fn reply(&self, tick: u64, command: Command) -> SimResult<()> {
        self.replies
            .send(DecisionReply { tick, command })
            .map_err(|_| SimError::ChannelClosed("decision replies"))
    }
}
