//! Receiving side of a channel-backed decision gateway.

use crate::core::{Decision, ThreatPrompt};

use tokio::sync::{mpsc, oneshot};

/// One pending question from a scan worker.
#[derive(Debug)]
pub struct DecisionRequest {
    prompt: ThreatPrompt,
    reply: oneshot::Sender<Decision>,
}

impl DecisionRequest {
    pub(crate) fn new(prompt: ThreatPrompt, reply: oneshot::Sender<Decision>) -> Self {
        Self { prompt, reply }
    }

    /// The threat being asked about.
    pub fn prompt(&self) -> &ThreatPrompt {
        &self.prompt
    }

    /// Returns `true` if the worker stopped waiting (timeout or stop).
    pub fn is_cancelled(&self) -> bool {
        self.reply.is_closed()
    }

    /// Sends the answer. Returns `false` if the worker no longer waits.
    pub fn respond(self, decision: Decision) -> bool {
        self.reply.send(decision).is_ok()
    }
}

/// Where a foreground decision-maker receives requests.
///
/// Dropping the inbox makes every pending and future `ask` resolve to
/// [`Decision::Ignore`].
#[derive(Debug)]
pub struct DecisionInbox {
    rx: mpsc::Receiver<DecisionRequest>,
}

impl DecisionInbox {
    pub(crate) fn new(rx: mpsc::Receiver<DecisionRequest>) -> Self {
        Self { rx }
    }

    /// Waits for the next request; `None` once every gateway clone is gone.
    pub async fn recv(&mut self) -> Option<DecisionRequest> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for non-async consumers.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_recv(&mut self) -> Option<DecisionRequest> {
        self.rx.blocking_recv()
    }

    /// Returns a request if one is already queued.
    pub fn try_recv(&mut self) -> Option<DecisionRequest> {
        self.rx.try_recv().ok()
    }
}
