//! Scan orchestration.
//!
//! The `ScanManager` walks a target, fans files out to a pool of workers,
//! merges local and remote verdicts, asks for a decision on every threat
//! and applies it, reporting live progress to a [`ScanObserver`].

mod observer;
mod scan_manager;
mod session;
mod stop;

pub use observer::{ChannelObserver, FnObserver, NoopObserver, ScanEvent, ScanObserver};
pub use scan_manager::{
    default_workers, RemoteFailurePolicy, ScanManager, ScanManagerBuilder, ScanManagerConfig,
};
pub use session::{ScanSession, ScanTask};
pub use stop::StopSignal;
