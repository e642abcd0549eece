//! VirusTotal reputation backend.
//!
//! This module provides a lookup implementation that uses the VirusTotal
//! v3 API to fetch multi-engine verdicts for a file digest.
//!
//! # API Usage
//!
//! 1. `GET /files/{md5}` returns the last analysis stats for a known file
//! 2. On 404, optionally `POST /files` with the file body
//! 3. Poll `GET /analyses/{id}` until the analysis completes
//!
//! Every failure degrades to [`LookupOutcome::TransientFailure`].

use crate::core::{FileDigest, LookupOutcome, ReputationLookup, ScanError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const ENGINE: &str = "virustotal";

/// VirusTotal client configuration.
#[derive(Debug)]
pub struct VirusTotalConfig {
    /// API key (kept secret).
    pub api_key: SecretString,

    /// Base URL for the API.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to upload files the service has never seen.
    pub submit_unknown: bool,

    /// Largest file that will be uploaded (free tier: 32 MB).
    pub max_upload_size: u64,

    /// Wait before each poll of a submitted analysis.
    pub poll_delay: Duration,

    /// Maximum number of polls before giving up.
    pub max_polls: u32,

    /// Minimum spacing between consecutive requests.
    pub courtesy_delay: Duration,

    /// Enforce the spacing across all workers instead of per lookup.
    pub shared_spacing: bool,
}

impl VirusTotalConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: "https://www.virustotal.com/api/v3".to_string(),
            timeout: Duration::from_secs(30),
            submit_unknown: false,
            max_upload_size: 32 * 1024 * 1024,
            poll_delay: Duration::from_secs(15),
            max_polls: 4,
            courtesy_delay: Duration::from_secs(15),
            shared_spacing: false,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether to upload unknown files.
    pub fn with_submit_unknown(mut self, submit: bool) -> Self {
        self.submit_unknown = submit;
        self
    }

    /// Sets the maximum upload size.
    pub fn with_max_upload_size(mut self, size: u64) -> Self {
        self.max_upload_size = size;
        self
    }

    /// Sets the polling delay and maximum number of polls.
    pub fn with_polling(mut self, delay: Duration, max_polls: u32) -> Self {
        self.poll_delay = delay;
        self.max_polls = max_polls.max(1);
        self
    }

    /// Sets the courtesy spacing between requests.
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    /// Shares the courtesy spacing across every caller of the client.
    pub fn with_shared_spacing(mut self, shared: bool) -> Self {
        self.shared_spacing = shared;
        self
    }
}

/// VirusTotal v3 lookup client.
///
/// # Example
///
/// ```rust,ignore
/// use hashguard::backends::virustotal::{VirusTotalClient, VirusTotalConfig};
///
/// let config = VirusTotalConfig::new("your-api-key").with_submit_unknown(true);
/// let client = VirusTotalClient::new(config)?;
/// ```
#[derive(Debug)]
pub struct VirusTotalClient {
    config: VirusTotalConfig,
    client: reqwest::Client,
    last_request: Mutex<Option<Instant>>,
}

impl VirusTotalClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: VirusTotalConfig) -> Result<Self, ScanError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(ScanError::configuration("VirusTotal API key is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            last_request: Mutex::new(None),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &VirusTotalConfig {
        &self.config
    }

    /// Waits out the courtesy spacing before a request.
    ///
    /// With `shared_spacing` the gate is shared by every caller of the
    /// client; otherwise `sent` holds when the previous request of the
    /// current lookup was answered.
    async fn pace(&self, sent: Option<Instant>) {
        let delay = self.config.courtesy_delay;
        if delay.is_zero() {
            return;
        }

        if self.config.shared_spacing {
            let mut last = self.last_request.lock().await;
            if let Some(previous) = *last {
                sleep_until(previous + delay).await;
            }
            *last = Some(Instant::now());
            return;
        }

        if let Some(previous) = sent {
            sleep_until(previous + delay).await;
        }
    }

    /// Per-lookup spacing: the worker sleeps after its last request.
    async fn cool_down(&self) {
        if !self.config.shared_spacing && !self.config.courtesy_delay.is_zero() {
            tokio::time::sleep(self.config.courtesy_delay).await;
        }
    }

    async fn get(
        &self,
        url: &str,
        sent: &mut Option<Instant>,
    ) -> Result<reqwest::Response, ScanError> {
        self.pace(*sent).await;
        let response = self
            .client
            .get(url)
            .header("x-apikey", self.config.api_key.expose_secret())
            .send()
            .await;
        *sent = Some(Instant::now());
        response.map_err(|e| map_transport_error(e, self.config.timeout))
    }

    /// Looks up a file report. `Ok(None)` means the service has no report.
    async fn fetch_report(
        &self,
        digest: &FileDigest,
        sent: &mut Option<Instant>,
    ) -> Result<Option<(u32, u32)>, ScanError> {
        let url = format!("{}/files/{}", self.config.base_url, digest);
        let response = self.get(&url, sent).await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(status)?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScanError::ambiguous(ENGINE, e.to_string()))?;
        parse_file_report(&body).map(Some)
    }

    /// Uploads a file and returns the analysis handle.
    async fn submit(&self, path: &Path, sent: &mut Option<Instant>) -> Result<String, ScanError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ScanError::from_open(path, e))?
            .len();
        if size > self.config.max_upload_size {
            return Err(ScanError::configuration(format!(
                "file of {size} bytes exceeds upload limit of {} bytes",
                self.config.max_upload_size
            )));
        }
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ScanError::from_open(path, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data).file_name(file_name));

        self.pace(*sent).await;
        let response = self
            .client
            .post(format!("{}/files", self.config.base_url))
            .header("x-apikey", self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await;
        *sent = Some(Instant::now());
        let response = response.map_err(|e| map_transport_error(e, self.config.timeout))?;
        check_status(response.status())?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScanError::ambiguous(ENGINE, e.to_string()))?;
        parse_analysis_handle(&body)
    }

    /// Polls an analysis until it completes or the poll budget runs out.
    async fn poll_analysis(
        &self,
        handle: &str,
        sent: &mut Option<Instant>,
    ) -> Result<(u32, u32), ScanError> {
        let url = format!("{}/analyses/{}", self.config.base_url, handle);
        let started = Instant::now();

        for attempt in 1..=self.config.max_polls {
            tokio::time::sleep(self.config.poll_delay).await;

            let response = self.get(&url, sent).await?;
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                tracing::debug!(attempt, handle, "Analysis not ready");
                continue;
            }
            check_status(status)?;

            let body: Value = response
                .json()
                .await
                .map_err(|e| ScanError::ambiguous(ENGINE, e.to_string()))?;
            if let Some(counts) = parse_analysis(&body)? {
                return Ok(counts);
            }
            tracing::debug!(attempt, handle, "Analysis still queued");
        }

        Err(ScanError::timeout(ENGINE, started.elapsed()))
    }

    async fn lookup_inner(
        &self,
        digest: &FileDigest,
        path: Option<&Path>,
    ) -> Result<LookupOutcome, ScanError> {
        let mut sent = None;
        if let Some((malicious, suspicious)) = self.fetch_report(digest, &mut sent).await? {
            return Ok(LookupOutcome::Known {
                malicious,
                suspicious,
            });
        }

        let Some(path) = path.filter(|_| self.config.submit_unknown) else {
            tracing::debug!(digest = %digest, "Digest unknown to VirusTotal");
            return Ok(LookupOutcome::Unknown);
        };

        tracing::info!(digest = %digest, path = %path.display(), "Submitting unknown file");
        let handle = self.submit(path, &mut sent).await?;
        let (malicious, suspicious) = self.poll_analysis(&handle, &mut sent).await?;
        Ok(LookupOutcome::Known {
            malicious,
            suspicious,
        })
    }
}

#[async_trait]
impl ReputationLookup for VirusTotalClient {
    fn name(&self) -> &str {
        ENGINE
    }

    async fn lookup(&self, digest: &FileDigest, path: Option<&Path>) -> LookupOutcome {
        let outcome = match self.lookup_inner(digest, path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    digest = %digest,
                    error = %e,
                    retryable = e.is_recoverable(),
                    "VirusTotal lookup failed"
                );
                LookupOutcome::transient(e.to_string())
            }
        };
        self.cool_down().await;
        outcome
    }
}

async fn sleep_until(ready_at: Instant) {
    let now = Instant::now();
    if ready_at > now {
        tokio::time::sleep(ready_at - now).await;
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> ScanError {
    if err.is_timeout() {
        ScanError::timeout(ENGINE, timeout)
    } else {
        ScanError::connection_failed(ENGINE, err.to_string())
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), ScanError> {
    match status {
        s if s.is_success() => Ok(()),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            Err(ScanError::AuthenticationFailed {
                engine: ENGINE.to_string(),
                reason: format!("API returned {status}"),
            })
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => Err(ScanError::RateLimited {
            engine: ENGINE.to_string(),
            retry_after: Some(Duration::from_secs(60)),
        }),
        s => Err(ScanError::ambiguous(ENGINE, format!("API error: {s}"))),
    }
}

fn count(stats: &Value, key: &str) -> u32 {
    stats
        .get(key)
        .and_then(Value::as_u64)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Extracts `(malicious, suspicious)` from a `/files/{id}` response.
fn parse_file_report(json: &Value) -> Result<(u32, u32), ScanError> {
    let stats = json
        .pointer("/data/attributes/last_analysis_stats")
        .ok_or_else(|| ScanError::ambiguous(ENGINE, "Missing analysis stats"))?;
    Ok((count(stats, "malicious"), count(stats, "suspicious")))
}

/// Extracts the analysis id from a `POST /files` response.
fn parse_analysis_handle(json: &Value) -> Result<String, ScanError> {
    json.pointer("/data/id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ScanError::ambiguous(ENGINE, "Missing analysis id"))
}

/// Reads an `/analyses/{id}` response; `None` while still running.
fn parse_analysis(json: &Value) -> Result<Option<(u32, u32)>, ScanError> {
    let attributes = json
        .pointer("/data/attributes")
        .ok_or_else(|| ScanError::ambiguous(ENGINE, "Missing analysis attributes"))?;

    if attributes.get("status").and_then(Value::as_str) != Some("completed") {
        return Ok(None);
    }

    let stats = attributes
        .get("stats")
        .ok_or_else(|| ScanError::ambiguous(ENGINE, "Missing analysis stats"))?;
    Ok(Some((count(stats, "malicious"), count(stats, "suspicious"))))
}
