//! The worker-facing side of the decision flow.

use crate::core::{Decision, ThreatPrompt};
use crate::gateway::inbox::{DecisionInbox, DecisionRequest};
use crate::manager::StopSignal;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

type PolicyFn = dyn Fn(&ThreatPrompt) -> Decision + Send + Sync;

#[derive(Clone)]
enum Responder {
    Detached,
    Policy(Arc<PolicyFn>),
    Channel(mpsc::Sender<DecisionRequest>),
}

/// Asks a decision-maker what to do with a detected threat.
///
/// Cloned into every scan worker. Each [`ask`](Self::ask) is independent
/// and always produces a decision: anything other than an answer (no
/// decision-maker, a dropped inbox, a timeout, a stop) yields
/// [`Decision::Ignore`].
///
/// # Examples
///
/// ```rust
/// use hashguard::core::Decision;
/// use hashguard::gateway::DecisionGateway;
///
/// let automatic = DecisionGateway::fixed(Decision::Quarantine);
/// assert!(!automatic.is_interactive());
///
/// let (interactive, _inbox) = DecisionGateway::channel(8);
/// assert!(interactive.is_interactive());
/// ```
#[derive(Clone)]
pub struct DecisionGateway {
    responder: Responder,
    timeout: Option<Duration>,
}

impl DecisionGateway {
    /// A gateway with no decision-maker; every threat is ignored.
    pub fn detached() -> Self {
        Self {
            responder: Responder::Detached,
            timeout: None,
        }
    }

    /// Answers every prompt with the same decision.
    pub fn fixed(decision: Decision) -> Self {
        Self::policy(move |_| decision)
    }

    /// Answers prompts inline with a closure.
    pub fn policy<F>(policy: F) -> Self
    where
        F: Fn(&ThreatPrompt) -> Decision + Send + Sync + 'static,
    {
        Self {
            responder: Responder::Policy(Arc::new(policy)),
            timeout: None,
        }
    }

    /// Forwards prompts to a foreground consumer.
    ///
    /// `buffer` bounds the number of unanswered requests queued at once.
    pub fn channel(buffer: usize) -> (Self, DecisionInbox) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let gateway = Self {
            responder: Responder::Channel(tx),
            timeout: None,
        };
        (gateway, DecisionInbox::new(rx))
    }

    /// Gives up on an unanswered prompt after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns `true` if prompts reach an external consumer.
    pub fn is_interactive(&self) -> bool {
        matches!(self.responder, Responder::Channel(_))
    }

    /// Obtains a decision for one threat.
    pub async fn ask(&self, prompt: &ThreatPrompt, stop: &StopSignal) -> Decision {
        if stop.is_stopped() {
            return Decision::Ignore;
        }

        let tx = match &self.responder {
            Responder::Detached => return Decision::Ignore,
            Responder::Policy(policy) => return (**policy)(prompt),
            Responder::Channel(tx) => tx,
        };

        let exchange = async {
            let (reply, answer) = oneshot::channel();
            tx.send(DecisionRequest::new(prompt.clone(), reply))
                .await
                .ok()?;
            answer.await.ok()
        };

        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, exchange).await {
                    Ok(answer) => answer,
                    Err(_) => {
                        tracing::warn!(
                            file = %prompt.file_path.display(),
                            timeout_ms = limit.as_millis() as u64,
                            "Decision timed out"
                        );
                        None
                    }
                },
                None => exchange.await,
            }
        };

        tokio::select! {
            answer = bounded => answer.unwrap_or_else(|| {
                tracing::debug!(file = %prompt.file_path.display(), "No decision received");
                Decision::Ignore
            }),
            _ = stop.stopped() => {
                tracing::debug!(file = %prompt.file_path.display(), "Decision abandoned on stop");
                Decision::Ignore
            }
        }
    }
}

impl Default for DecisionGateway {
    fn default() -> Self {
        Self::detached()
    }
}

impl fmt::Debug for DecisionGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.responder {
            Responder::Detached => "detached",
            Responder::Policy(_) => "policy",
            Responder::Channel(_) => "channel",
        };
        f.debug_struct("DecisionGateway")
            .field("responder", &kind)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileHasher, ThreatSource, Verdict};

    fn prompt() -> ThreatPrompt {
        ThreatPrompt {
            file_path: "/tmp/eicar.com".into(),
            digest: FileHasher::new().digest_bytes(b"eicar"),
            source: ThreatSource::Local,
            verdict: Verdict::LocalMatch,
        }
    }

    #[tokio::test]
    async fn test_detached_ignores() {
        let gateway = DecisionGateway::detached();
        assert_eq!(gateway.ask(&prompt(), &StopSignal::new()).await, Decision::Ignore);
    }

    #[tokio::test]
    async fn test_policy_answers_inline() {
        let gateway = DecisionGateway::policy(|p| match p.source {
            ThreatSource::Local => Decision::Delete,
            ThreatSource::Remote => Decision::Quarantine,
        });
        assert_eq!(gateway.ask(&prompt(), &StopSignal::new()).await, Decision::Delete);
    }

    #[tokio::test]
    async fn test_channel_round_trip() {
        let (gateway, mut inbox) = DecisionGateway::channel(4);

        let consumer = tokio::spawn(async move {
            let request = inbox.recv().await.unwrap();
            assert_eq!(request.prompt().source_label(), "Local");
            assert!(request.respond(Decision::Quarantine));
        });

        let decision = gateway.ask(&prompt(), &StopSignal::new()).await;
        assert_eq!(decision, Decision::Quarantine);
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_inbox_ignores() {
        let (gateway, inbox) = DecisionGateway::channel(4);
        drop(inbox);
        assert_eq!(gateway.ask(&prompt(), &StopSignal::new()).await, Decision::Ignore);
    }

    #[tokio::test]
    async fn test_dropped_reply_ignores() {
        let (gateway, mut inbox) = DecisionGateway::channel(4);
        tokio::spawn(async move {
            let request = inbox.recv().await.unwrap();
            drop(request);
        });
        assert_eq!(gateway.ask(&prompt(), &StopSignal::new()).await, Decision::Ignore);
    }

    #[tokio::test]
    async fn test_timeout_ignores() {
        let (gateway, mut inbox) = DecisionGateway::channel(4);
        let gateway = gateway.with_timeout(Duration::from_millis(20));

        let decision = gateway.ask(&prompt(), &StopSignal::new()).await;
        assert_eq!(decision, Decision::Ignore);

        let late = inbox.try_recv().unwrap();
        assert!(late.is_cancelled());
        assert!(!late.respond(Decision::Delete));
    }

    #[tokio::test]
    async fn test_stop_releases_waiting_worker() {
        let (gateway, _inbox) = DecisionGateway::channel(4);
        let stop = StopSignal::new();

        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { gateway.ask(&prompt(), &stop).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.stop();

        let decision = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decision, Decision::Ignore);
    }

    #[tokio::test]
    async fn test_already_stopped_skips_prompt() {
        let gateway = DecisionGateway::fixed(Decision::Delete);
        let stop = StopSignal::new();
        stop.stop();
        assert_eq!(gateway.ask(&prompt(), &stop).await, Decision::Ignore);
    }
}
