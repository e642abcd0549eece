//! Decision flow between scan workers and a decision-maker.
//!
//! Workers call [`DecisionGateway::ask`] for every non-clean verdict. The
//! gateway either answers inline (detached, fixed or policy gateways) or
//! forwards a [`DecisionRequest`] to a [`DecisionInbox`] owned by a
//! foreground consumer such as a terminal prompt.

mod decision;
mod inbox;

pub use decision::DecisionGateway;
pub use inbox::{DecisionInbox, DecisionRequest};
