//! Snapshot acquisition for Brand Pulse: HTTP fetch with retry/backoff,
//! local-file loading, and content hashing.
//!
//! The pipeline works on one in-memory snapshot per load; everything here
//! resolves to either a [`Snapshot`] or a terminal [`FetchError`] for that
//! attempt. Fallback policy lives upstream in the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use brandpulse_core::SnapshotInfo;
use chrono::Utc;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info_span, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "brandpulse-source";

/// One fetched spreadsheet export plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub body: String,
    pub info: SnapshotInfo,
}

impl Snapshot {
    pub fn from_body(origin: impl Into<String>, body: String) -> Self {
        let content_hash = sha256_hex(body.as_bytes());
        let byte_size = body.len();
        Self {
            body,
            info: SnapshotInfo {
                origin: origin.into(),
                fetched_at: Utc::now(),
                content_hash,
                byte_size,
            },
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("reading snapshot file {path:?}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub backoff: BackoffPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: None,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Anything that can produce one spreadsheet snapshot per load attempt.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    fn origin(&self) -> String;
    async fn fetch(&self, run_id: Uuid) -> Result<Snapshot, FetchError>;
}

/// Published-spreadsheet source: GET with capped exponential backoff on
/// 5xx/429 and transport-level failures.
#[derive(Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    backoff: BackoffPolicy,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, config: HttpConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().context("building reqwest client")?;
        Ok(Self {
            client,
            url: url.into(),
            backoff: config.backoff,
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    fn origin(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self, run_id: Uuid) -> Result<Snapshot, FetchError> {
        let span = info_span!("snapshot_fetch", %run_id, url = %self.url);
        self.fetch_with_retries().instrument(span).await
    }
}

impl HttpSource {
    async fn fetch_with_retries(&self) -> Result<Snapshot, FetchError> {
        let mut last_request_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.backoff.max_retries {
            match self.client.get(&self.url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();

                    if status.is_success() {
                        let body = resp.bytes().await?.to_vec();
                        let text = String::from_utf8_lossy(&body).into_owned();
                        return Ok(Snapshot::from_body(final_url, text));
                    }

                    if classify_status(status) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }

                    return Err(FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: final_url,
                    });
                }
                Err(err) => {
                    if classify_reqwest_error(&err) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        last_request_error = Some(err);
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::Request(err));
                }
            }
        }

        Err(FetchError::Request(
            last_request_error.expect("retry loop should capture a request error"),
        ))
    }
}

/// Local CSV export, mostly for offline use and tests.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self, _run_id: Uuid) -> Result<Snapshot, FetchError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::File {
                path: self.path.clone(),
                source,
            })?;
        Ok(Snapshot::from_body(self.origin(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn content_hashing_is_stable() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn backoff_logic_is_exponential_and_capped() {
        let policy = BackoffPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(350));
    }

    #[test]
    fn status_classification_retries_server_side_failures() {
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            RetryDisposition::Retryable
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            RetryDisposition::Retryable
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            RetryDisposition::NonRetryable
        );
    }

    #[tokio::test]
    async fn file_source_hashes_and_labels_the_snapshot() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(file, "Brand,Type\nAcme,Retail\n").expect("write");

        let source = FileSource::new(file.path());
        let snapshot = source.fetch(Uuid::new_v4()).await.expect("fetch");
        assert_eq!(snapshot.body, "Brand,Type\nAcme,Retail\n");
        assert_eq!(snapshot.info.origin, file.path().display().to_string());
        assert_eq!(snapshot.info.byte_size, snapshot.body.len());
        assert_eq!(
            snapshot.info.content_hash,
            sha256_hex(snapshot.body.as_bytes())
        );
    }

    #[tokio::test]
    async fn file_source_surfaces_missing_files() {
        let source = FileSource::new("/definitely/not/here.csv");
        let err = source.fetch(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, FetchError::File { .. }));
    }
}
