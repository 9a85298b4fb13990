//! Best-effort relay of closed sessions to the remote aggregator.
//!
//! The forwarder is deliberately at-most-once: transport failures are logged
//! and dropped, never retried and never surfaced to the tracker. Durability
//! for the user-facing view comes from the local bucket store; the remote
//! store only feeds the cross-device dashboard, so under sustained network
//! failure the remote aggregates under-count and that is accepted.
//!
//! Forwarding runs on a dedicated worker thread with its own current-thread
//! runtime, fed through an unbounded channel. [`Forwarder::forward`] only
//! enqueues, so the tracker's event path never blocks on the network.

use std::fmt;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use dw_core::{Category, Session};

/// Per-request timeout for ingestion calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Forwarder setup errors.
///
/// Only construction can fail; forwarding itself is infallible by contract.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The endpoint URL was empty.
    #[error("remote endpoint cannot be empty")]
    EmptyEndpoint,
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// Failed to start the worker runtime or thread.
    #[error("failed to start forwarder worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// The wire payload accepted by the ingestion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingRecord {
    pub domain: String,
    pub duration_ms: i64,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

/// Handle to the forwarding worker.
///
/// Dropping the handle stops the worker after it drains whatever is already
/// queued; [`Forwarder::shutdown`] additionally waits for that drain so
/// short-lived processes get their best-effort attempt in before exit.
pub struct Forwarder {
    tx: mpsc::UnboundedSender<OutgoingRecord>,
    worker: JoinHandle<()>,
}

impl fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder").finish_non_exhaustive()
    }
}

impl Forwarder {
    /// Spawns the forwarding worker for the given ingestion endpoint.
    pub fn spawn(endpoint: impl Into<String>) -> Result<Self, ForwardError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(ForwardError::EmptyEndpoint);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ForwardError::ClientBuild)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ForwardError::Worker)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = std::thread::Builder::new()
            .name("dw-forwarder".to_string())
            .spawn(move || runtime.block_on(relay_loop(client, endpoint, rx)))
            .map_err(ForwardError::Worker)?;

        Ok(Self { tx, worker })
    }

    /// Enqueues one closed session for delivery. Never blocks.
    ///
    /// Failures at every stage, including a worker that has already gone
    /// away, are logged and swallowed.
    pub fn forward(&self, session: &Session, category: Category) {
        let record = OutgoingRecord {
            domain: session.domain.clone(),
            duration_ms: session.duration_ms,
            category,
            timestamp: session.ended_at,
        };
        if self.tx.send(record).is_err() {
            tracing::warn!(
                domain = %session.domain,
                "forwarder worker is gone; session kept locally only"
            );
        }
    }

    /// Stops the worker after it drains the queue.
    pub fn shutdown(self) {
        drop(self.tx);
        if self.worker.join().is_err() {
            tracing::warn!("forwarder worker panicked during shutdown");
        }
    }
}

async fn relay_loop(
    client: reqwest::Client,
    endpoint: String,
    mut rx: mpsc::UnboundedReceiver<OutgoingRecord>,
) {
    while let Some(record) = rx.recv().await {
        match client.post(&endpoint).json(&record).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(domain = %record.domain, "session forwarded");
            }
            Ok(response) => {
                tracing::warn!(
                    domain = %record.domain,
                    status = %response.status(),
                    "ingestion endpoint rejected session; dropping"
                );
            }
            Err(err) => {
                tracing::warn!(
                    domain = %record.domain,
                    error = %err,
                    "failed to reach ingestion endpoint; session kept locally only"
                );
            }
        }
    }
}
