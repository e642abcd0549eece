//! The main scan manager implementation.

use crate::audit;
use crate::core::{
    AbortReason, ArcReputation, Decision, FileDigest, FileHasher, LookupOutcome, ScanError,
    ScanSummary, ScanTermination, ThreatPrompt, ThreatRecord, Verdict,
};
use crate::gateway::DecisionGateway;
use crate::manager::observer::ScanObserver;
use crate::manager::session::{ScanSession, ScanTask};
use crate::manager::stop::StopSignal;
use crate::quarantine::QuarantineStore;
use crate::signatures::SignatureSet;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// What to do when a reputation lookup fails transiently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteFailurePolicy {
    /// Treat the file as clean and log a warning.
    #[default]
    FailOpen,
    /// Report the file with a `LookupFailed` verdict.
    FailClosed,
}

/// Configuration for the scan manager.
#[derive(Debug, Clone)]
pub struct ScanManagerConfig {
    /// Number of concurrent workers.
    pub workers: usize,

    /// Handling of transient reputation failures.
    pub remote_failure_policy: RemoteFailurePolicy,

    /// Abort when the signature set is empty.
    pub require_signatures: bool,

    /// Upper bound on waiting for a decision; overrides the gateway's own.
    pub decision_timeout: Option<Duration>,

    /// Follow symbolic links while walking directories.
    pub follow_symlinks: bool,
}

impl Default for ScanManagerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            remote_failure_policy: RemoteFailurePolicy::default(),
            require_signatures: true,
            decision_timeout: None,
            follow_symlinks: false,
        }
    }
}

/// Number of workers used when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl ScanManagerConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the transient failure policy.
    pub fn with_remote_failure_policy(mut self, policy: RemoteFailurePolicy) -> Self {
        self.remote_failure_policy = policy;
        self
    }

    /// Allows or forbids scanning with an empty signature set.
    pub fn with_require_signatures(mut self, required: bool) -> Self {
        self.require_signatures = required;
        self
    }

    /// Sets the decision timeout.
    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = Some(timeout);
        self
    }

    /// Enables or disables following symbolic links.
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Builder for creating a `ScanManager`.
#[derive(Default)]
pub struct ScanManagerBuilder {
    reputation: Option<ArcReputation>,
    quarantine: Option<Arc<dyn QuarantineStore>>,
    hasher: FileHasher,
    config: ScanManagerConfig,
}

impl ScanManagerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reputation service consulted for digests not in the
    /// signature set.
    pub fn with_reputation<R: crate::core::ReputationLookup + 'static>(
        mut self,
        reputation: R,
    ) -> Self {
        self.reputation = Some(Arc::new(reputation));
        self
    }

    /// Sets a reputation service wrapped in an Arc.
    pub fn with_arc_reputation(mut self, reputation: ArcReputation) -> Self {
        self.reputation = Some(reputation);
        self
    }

    /// Sets the quarantine store.
    pub fn with_quarantine<Q: QuarantineStore + 'static>(mut self, store: Q) -> Self {
        self.quarantine = Some(Arc::new(store));
        self
    }

    /// Sets a quarantine store wrapped in an Arc.
    pub fn with_arc_quarantine(mut self, store: Arc<dyn QuarantineStore>) -> Self {
        self.quarantine = Some(store);
        self
    }

    /// Sets the hasher.
    pub fn with_hasher(mut self, hasher: FileHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ScanManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the scan manager.
    pub fn build(self) -> Result<ScanManager, ScanError> {
        if self.config.workers == 0 {
            return Err(ScanError::configuration("At least one worker is required"));
        }

        if self.reputation.is_none() {
            tracing::debug!("No reputation service configured, local signatures only");
        }

        Ok(ScanManager {
            reputation: self.reputation,
            quarantine: self.quarantine,
            hasher: self.hasher,
            config: self.config,
        })
    }
}

/// Orchestrates a scan: traversal, worker pool, verdicts, decisions and
/// actions.
///
/// Cheap to clone; clones share the reputation service and quarantine
/// store.
///
/// # Examples
///
/// ```rust,no_run
/// use hashguard::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), ScanError> {
/// let manager = ScanManager::builder()
///     .with_quarantine(FilesystemQuarantine::new("./quarantine").unwrap())
///     .build()?;
///
/// let signatures = Arc::new(SignatureSet::load("Hashes.txt"));
/// let records = manager
///     .scan(
///         "./downloads",
///         signatures,
///         Arc::new(NoopObserver),
///         &DecisionGateway::fixed(Decision::Quarantine),
///     )
///     .await;
/// println!("{} threats", records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScanManager {
    reputation: Option<ArcReputation>,
    quarantine: Option<Arc<dyn QuarantineStore>>,
    hasher: FileHasher,
    config: ScanManagerConfig,
}

impl std::fmt::Debug for ScanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanManager")
            .field("reputation", &self.reputation.as_ref().map(|r| r.name().to_string()))
            .field("quarantine", &self.quarantine.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// Everything a worker task needs, shared by all workers of one scan.
struct WorkerContext {
    manager: ScanManager,
    session: ScanSession,
    signatures: Arc<SignatureSet>,
    observer: Arc<dyn ScanObserver>,
    gateway: DecisionGateway,
    stop: StopSignal,
}

impl ScanManager {
    /// Creates a new builder.
    pub fn builder() -> ScanManagerBuilder {
        ScanManagerBuilder::new()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ScanManagerConfig {
        &self.config
    }

    /// Returns the reputation service, if any.
    pub fn reputation(&self) -> Option<&ArcReputation> {
        self.reputation.as_ref()
    }

    /// Returns the quarantine store, if any.
    pub fn quarantine(&self) -> Option<&Arc<dyn QuarantineStore>> {
        self.quarantine.as_ref()
    }

    /// Scans a file or directory tree and returns the threats found.
    ///
    /// Never fails: per-file problems are logged and skipped, and a scan
    /// that cannot start reports its reason through the observer's
    /// completion event and returns no records.
    pub async fn scan(
        &self,
        target: impl AsRef<Path>,
        signatures: Arc<SignatureSet>,
        observer: Arc<dyn ScanObserver>,
        gateway: &DecisionGateway,
    ) -> Vec<ThreatRecord> {
        self.scan_with_stop(target, signatures, observer, gateway, StopSignal::new())
            .await
    }

    /// Starts a scan on its own task.
    pub fn spawn_scan(
        &self,
        target: impl Into<PathBuf>,
        signatures: Arc<SignatureSet>,
        observer: Arc<dyn ScanObserver>,
        gateway: DecisionGateway,
    ) -> ScanTask {
        let stop = StopSignal::new();
        let manager = self.clone();
        let target = target.into();
        let task_stop = stop.clone();

        let handle = tokio::spawn(async move {
            manager
                .scan_with_stop(target, signatures, observer, &gateway, task_stop)
                .await
        });

        ScanTask::new(stop, handle)
    }

    /// Scans with an externally controlled stop signal.
    pub async fn scan_with_stop(
        &self,
        target: impl AsRef<Path>,
        signatures: Arc<SignatureSet>,
        observer: Arc<dyn ScanObserver>,
        gateway: &DecisionGateway,
        stop: StopSignal,
    ) -> Vec<ThreatRecord> {
        let started_at = Instant::now();
        let target = target.as_ref().to_path_buf();

        if signatures.is_empty() && self.config.require_signatures {
            tracing::error!(scan_target = %target.display(), "Scan aborted: no signatures loaded");
            return self.abort(target, AbortReason::NoSignatures, started_at, &*observer);
        }

        let files = match self.resolve_targets(&target).await {
            Ok(files) => files,
            Err(reason) => {
                tracing::error!(scan_target = %target.display(), reason = %reason, "Scan aborted");
                return self.abort(target, reason, started_at, &*observer);
            }
        };

        let total = files.len();
        let session = ScanSession::new(target, files, started_at);

        if total == 0 {
            tracing::info!(scan_target = %session.target().display(), "Nothing to scan");
            finish(&session, 0, ScanTermination::Completed, &*observer);
            return Vec::new();
        }

        let workers = self.config.workers.clamp(1, total);
        audit::emit_scan_started(session.target(), total, workers);

        let gateway = match self.config.decision_timeout {
            Some(timeout) => gateway.clone().with_timeout(timeout),
            None => gateway.clone(),
        };

        let ctx = Arc::new(WorkerContext {
            manager: self.clone(),
            session,
            signatures,
            observer,
            gateway,
            stop,
        });

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let ctx = Arc::clone(&ctx);
            pool.spawn(async move { ctx.run_worker(worker_id).await });
        }

        let mut records = Vec::new();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(mut worker_records) => records.append(&mut worker_records),
                Err(e) => tracing::error!(error = %e, "Scan worker failed"),
            }
        }

        let termination = if ctx.session.processed() < total && ctx.stop.is_stopped() {
            ScanTermination::Stopped
        } else {
            ScanTermination::Completed
        };
        finish(&ctx.session, records.len(), termination, &*ctx.observer);

        records
    }

    fn abort(
        &self,
        target: PathBuf,
        reason: AbortReason,
        started_at: Instant,
        observer: &dyn ScanObserver,
    ) -> Vec<ThreatRecord> {
        let session = ScanSession::new(target, Vec::new(), started_at);
        finish(&session, 0, ScanTermination::Aborted(reason), observer);
        Vec::new()
    }

    /// Expands the target into the list of regular files to scan.
    async fn resolve_targets(&self, target: &Path) -> Result<Vec<PathBuf>, AbortReason> {
        let target = target.to_path_buf();
        let follow = self.config.follow_symlinks;

        let walked = tokio::task::spawn_blocking(move || collect_files(&target, follow)).await;
        walk_outcome(walked)
    }

    /// Local signatures first, then the reputation service.
    async fn classify(
        &self,
        digest: &FileDigest,
        path: &Path,
        signatures: &SignatureSet,
    ) -> Verdict {
        if signatures.contains(digest) {
            tracing::debug!(file = %path.display(), digest = %digest, "Local signature match");
            return Verdict::LocalMatch;
        }

        let Some(reputation) = &self.reputation else {
            return Verdict::Clean;
        };

        match reputation.lookup(digest, Some(path)).await {
            LookupOutcome::Known {
                malicious,
                suspicious,
            } => Verdict::from_counts(malicious, suspicious),
            LookupOutcome::Unknown => Verdict::Clean,
            LookupOutcome::TransientFailure { reason } => match self.config.remote_failure_policy
            {
                RemoteFailurePolicy::FailOpen => {
                    tracing::warn!(
                        file = %path.display(),
                        engine = reputation.name(),
                        reason = %reason,
                        "Reputation lookup failed, treating file as clean"
                    );
                    Verdict::Clean
                }
                RemoteFailurePolicy::FailClosed => {
                    tracing::warn!(
                        file = %path.display(),
                        engine = reputation.name(),
                        reason = %reason,
                        "Reputation lookup failed, reporting file"
                    );
                    Verdict::LookupFailed
                }
            },
        }
    }

    /// Carries out a decision. Returns whether a filesystem action
    /// succeeded; `Ignore` applies nothing.
    async fn apply(&self, decision: Decision, path: &Path, digest: &FileDigest) -> bool {
        match decision {
            Decision::Ignore => false,
            Decision::Delete => match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    tracing::info!(file = %path.display(), "File deleted");
                    true
                }
                Err(e) => {
                    tracing::error!(file = %path.display(), error = %e, "Delete failed");
                    false
                }
            },
            Decision::Quarantine => {
                let Some(store) = &self.quarantine else {
                    tracing::error!(file = %path.display(), "No quarantine store configured");
                    return false;
                };
                match store.quarantine(path, digest).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::error!(file = %path.display(), error = %e, "Quarantine failed");
                        false
                    }
                }
            }
        }
    }
}

impl WorkerContext {
    async fn run_worker(&self, worker_id: usize) -> Vec<ThreatRecord> {
        let total = self.session.total_files();
        let mut records = Vec::new();

        loop {
            if self.stop.is_stopped() {
                tracing::debug!(worker_id, "Worker observed stop");
                break;
            }
            let Some((index, path)) = self.session.claim() else {
                break;
            };

            self.observer.on_progress(index, total, path);

            if let Some(record) = self.process_file(path).await {
                audit::emit_threat(&record);
                self.observer.on_threat(&record);
                records.push(record);
            }
        }

        records
    }

    async fn process_file(&self, path: &Path) -> Option<ThreatRecord> {
        let manager = &self.manager;

        let digest = match manager.hasher.digest_file_async(path).await {
            Ok(digest) => digest,
            Err(e) if e.is_per_file() => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable file");
                return None;
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "Hashing failed");
                return None;
            }
        };

        let verdict = manager.classify(&digest, path, &self.signatures).await;
        let source = verdict.source()?;

        let prompt = ThreatPrompt {
            file_path: path.to_path_buf(),
            digest: digest.clone(),
            source,
            verdict,
        };
        let decision = self.gateway.ask(&prompt, &self.stop).await;
        let applied = manager.apply(decision, path, &digest).await;

        ThreatRecord::new(path, digest, verdict, decision, applied)
    }
}

fn walk_outcome(
    walked: Result<Result<Vec<PathBuf>, AbortReason>, tokio::task::JoinError>,
) -> Result<Vec<PathBuf>, AbortReason> {
    walked.unwrap_or_else(|e| {
        Err(AbortReason::TraversalFailed {
            reason: e.to_string(),
        })
    })
}

fn collect_files(target: &Path, follow_symlinks: bool) -> Result<Vec<PathBuf>, AbortReason> {
    let invalid = || AbortReason::InvalidTarget {
        path: target.to_path_buf(),
    };

    let metadata = std::fs::metadata(target).map_err(|_| invalid())?;
    if metadata.is_file() {
        return Ok(vec![target.to_path_buf()]);
    }
    if !metadata.is_dir() {
        return Err(invalid());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(target).follow_links(follow_symlinks) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable entry"),
        }
    }
    Ok(files)
}

fn finish(
    session: &ScanSession,
    threats: usize,
    termination: ScanTermination,
    observer: &dyn ScanObserver,
) {
    let summary = ScanSummary {
        target: session.target().to_path_buf(),
        total_files: session.total_files(),
        processed: session.processed(),
        threats,
        elapsed: session.elapsed(),
        termination,
    };

    audit::emit_scan_completed(&summary);
    observer.on_complete(&summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockReputation;
    use crate::core::ThreatSource;
    use crate::manager::observer::{ChannelObserver, NoopObserver, ScanEvent};
    use crate::quarantine::FilesystemQuarantine;
    use crate::signatures::EICAR_MD5;
    use tempfile::TempDir;

    fn signatures_with(digests: &[&str]) -> Arc<SignatureSet> {
        Arc::new(SignatureSet::from_digests(digests.iter().copied()))
    }

    fn manager_with(reputation: MockReputation) -> ScanManager {
        ScanManager::builder()
            .with_reputation(reputation)
            .with_config(ScanManagerConfig::new().with_workers(2))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_rejects_zero_workers() {
        let result = ScanManager::builder()
            .with_config(ScanManagerConfig::new().with_workers(0))
            .build();
        assert!(matches!(result, Err(ScanError::Configuration { .. })));
    }

    #[test]
    fn test_collect_files_walks_tree() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("top.txt"), b"1").unwrap();
        std::fs::write(dir.path().join("a/b/deep.txt"), b"2").unwrap();

        let mut files = collect_files(dir.path(), false).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.is_file()));

        let single = collect_files(&dir.path().join("top.txt"), false).unwrap();
        assert_eq!(single.len(), 1);

        let missing = collect_files(&dir.path().join("nope"), false);
        assert!(matches!(missing, Err(AbortReason::InvalidTarget { .. })));
    }

    #[tokio::test]
    async fn test_failed_walk_task_aborts() {
        let joined = tokio::task::spawn_blocking(|| -> Result<Vec<PathBuf>, AbortReason> {
            panic!("walker crashed")
        })
        .await;

        let outcome = walk_outcome(joined);
        assert!(matches!(outcome, Err(AbortReason::TraversalFailed { .. })));
    }

    #[tokio::test]
    async fn test_local_match_skips_remote_lookup() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.bin");
        std::fs::write(&bad, b"known bad").unwrap();
        let digest = FileHasher::new().digest_bytes(b"known bad");

        let reputation = Arc::new(MockReputation::new());
        let manager = ScanManager::builder()
            .with_arc_reputation(reputation.clone())
            .build()
            .unwrap();

        let records = manager
            .scan(
                &bad,
                signatures_with(&[digest.as_str()]),
                Arc::new(NoopObserver),
                &DecisionGateway::detached(),
            )
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, ThreatSource::Local);
        assert_eq!(records[0].decision, Decision::Ignore);
        assert!(!records[0].action_applied);
        assert_eq!(reputation.lookup_count(), 0);
        assert!(bad.exists());
    }

    #[tokio::test]
    async fn test_fail_closed_reports_lookup_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x"), b"x").unwrap();

        let manager = ScanManager::builder()
            .with_reputation(MockReputation::new_unavailable())
            .with_config(
                ScanManagerConfig::new()
                    .with_remote_failure_policy(RemoteFailurePolicy::FailClosed),
            )
            .build()
            .unwrap();

        let records = manager
            .scan(
                dir.path(),
                signatures_with(&[EICAR_MD5]),
                Arc::new(NoopObserver),
                &DecisionGateway::detached(),
            )
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, ThreatSource::Remote);
        assert_eq!(records[0].malicious, None);
    }

    #[tokio::test]
    async fn test_delete_decision_removes_file() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad");
        std::fs::write(&bad, b"bad").unwrap();
        let digest = FileHasher::new().digest_bytes(b"bad");

        let records = manager_with(MockReputation::new())
            .scan(
                dir.path(),
                signatures_with(&[digest.as_str()]),
                Arc::new(NoopObserver),
                &DecisionGateway::fixed(Decision::Delete),
            )
            .await;

        assert_eq!(records.len(), 1);
        assert!(records[0].action_applied);
        assert!(!bad.exists());
    }

    #[tokio::test]
    async fn test_quarantine_without_store_is_not_applied() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad");
        std::fs::write(&bad, b"bad").unwrap();
        let digest = FileHasher::new().digest_bytes(b"bad");

        let records = manager_with(MockReputation::new())
            .scan(
                &bad,
                signatures_with(&[digest.as_str()]),
                Arc::new(NoopObserver),
                &DecisionGateway::fixed(Decision::Quarantine),
            )
            .await;

        assert_eq!(records[0].decision, Decision::Quarantine);
        assert!(!records[0].action_applied);
        assert!(bad.exists());
    }

    #[tokio::test]
    async fn test_quarantine_decision_moves_file() {
        let dir = TempDir::new().unwrap();
        let scan_dir = dir.path().join("scan");
        std::fs::create_dir(&scan_dir).unwrap();
        let bad = scan_dir.join("bad");
        std::fs::write(&bad, b"bad").unwrap();
        let digest = FileHasher::new().digest_bytes(b"bad");

        let store = Arc::new(FilesystemQuarantine::new(dir.path().join("q")).unwrap());
        let manager = ScanManager::builder()
            .with_arc_quarantine(store.clone())
            .build()
            .unwrap();

        let records = manager
            .scan(
                &scan_dir,
                signatures_with(&[digest.as_str()]),
                Arc::new(NoopObserver),
                &DecisionGateway::fixed(Decision::Quarantine),
            )
            .await;

        assert!(records[0].action_applied);
        assert!(!bad.exists());
        assert!(store.contains_digest(&digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_progress_precedes_threat_and_complete_fires_once() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            std::fs::write(dir.path().join(format!("f{i}")), format!("content {i}")).unwrap();
        }
        let bad_digest = FileHasher::new().digest_bytes(b"content 3");

        let (observer, mut rx) = ChannelObserver::new();
        let records = manager_with(MockReputation::new())
            .scan(
                dir.path(),
                signatures_with(&[bad_digest.as_str()]),
                Arc::new(observer),
                &DecisionGateway::detached(),
            )
            .await;
        assert_eq!(records.len(), 1);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        let progress: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Progress { index, total, .. } => Some((*index, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 5);
        assert!(progress.iter().all(|(i, t)| *t == 5 && (1..=5).contains(i)));

        let threat_at = events
            .iter()
            .position(|e| matches!(e, ScanEvent::Threat(_)))
            .unwrap();
        let threat_path = match &events[threat_at] {
            ScanEvent::Threat(record) => record.file_path.clone(),
            _ => unreachable!(),
        };
        let progress_at = events
            .iter()
            .position(|e| matches!(e, ScanEvent::Progress { path, .. } if *path == threat_path))
            .unwrap();
        assert!(progress_at < threat_at);

        let completions: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Complete(summary) => Some(summary),
                _ => None,
            })
            .collect();
        assert_eq!(completions.len(), 1);
        assert!(completions[0].is_complete());
        assert_eq!(completions[0].processed, 5);
        assert_eq!(completions[0].threats, 1);
    }

    #[tokio::test]
    async fn test_empty_directory_completes_without_workers() {
        let dir = TempDir::new().unwrap();
        let (observer, mut rx) = ChannelObserver::new();

        let records = manager_with(MockReputation::new())
            .scan(
                dir.path(),
                signatures_with(&[EICAR_MD5]),
                Arc::new(observer),
                &DecisionGateway::detached(),
            )
            .await;

        assert!(records.is_empty());
        match rx.try_recv() {
            Ok(ScanEvent::Complete(summary)) => {
                assert_eq!(summary.total_files, 0);
                assert!(summary.is_complete());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
