//! Remote policy pack retrieval and pin verification
//!
//! [`PackFetcher`] is the transport seam: it only returns raw bytes.
//! Integrity is enforced separately by [`verify_pin`] so that every
//! transport, including test doubles, goes through the same check.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use lopper_fs::checksum::sha256_hex;
use reqwest::Url;
use reqwest::blocking::Client;

use crate::reference::PinnedUrl;
use crate::{Error, Result};

const READ_CHUNK: usize = 8 * 1024;

/// How often a waiting fetch re-checks its [`CancelToken`].
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Caller-owned signal that aborts in-flight fetches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Retrieves the raw body of a remote policy pack.
pub trait PackFetcher {
    /// Fetch `url`, returning at most the configured number of bytes.
    fn fetch(&self, url: &Url, cancel: &CancelToken) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher with a request timeout and a body size cap.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::remote_fetch("<client>", e.to_string()))?;
        Ok(Self { client, max_bytes })
    }
}

impl PackFetcher for HttpFetcher {
    /// Fetch on a worker thread while this thread watches `cancel`.
    ///
    /// Cancelling returns [`Error::Cancelled`] within one poll interval even
    /// when the server has not answered yet; the worker's eventual result
    /// is discarded.
    fn fetch(&self, url: &Url, cancel: &CancelToken) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(cancelled(url));
        }

        tracing::debug!(%url, "Fetching remote policy pack");
        let (tx, rx) = mpsc::channel();
        {
            let client = self.client.clone();
            let url = url.clone();
            let cancel = cancel.clone();
            let max_bytes = self.max_bytes;
            thread::spawn(move || {
                let _ = tx.send(download(&client, &url, max_bytes, &cancel));
            });
        }

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(%url, "Remote policy pack fetch cancelled");
                return Err(cancelled(url));
            }
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => {
                    let body = result?;
                    tracing::debug!(%url, bytes = body.len(), "Fetched remote policy pack");
                    return Ok(body);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::remote_fetch(
                        url.as_str(),
                        "fetch worker exited without a result",
                    ));
                }
            }
        }
    }
}

fn cancelled(url: &Url) -> Error {
    Error::Cancelled {
        url: url.to_string(),
    }
}

/// Blocking GET of `url`, reading at most `max_bytes` of body.
fn download(client: &Client, url: &Url, max_bytes: u64, cancel: &CancelToken) -> Result<Vec<u8>> {
    let mut response = client
        .get(url.clone())
        .send()
        .map_err(|e| Error::remote_fetch(url.as_str(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::remote_fetch(
            url.as_str(),
            format!("unexpected HTTP status {status}"),
        ));
    }

    // One byte past the cap is enough to tell an oversize body apart.
    let mut limited = (&mut response).take(max_bytes.saturating_add(1));
    let mut body = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK];
    loop {
        if cancel.is_cancelled() {
            return Err(cancelled(url));
        }
        let read = limited
            .read(&mut chunk)
            .map_err(|e| Error::remote_fetch(url.as_str(), e.to_string()))?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    if body.len() as u64 > max_bytes {
        return Err(Error::remote_fetch(
            url.as_str(),
            format!("response body exceeds {max_bytes} bytes"),
        ));
    }
    Ok(body)
}

/// Require the SHA-256 of `bytes` to equal the pin exactly.
pub fn verify_pin(bytes: &[u8], pinned: &PinnedUrl) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual != pinned.digest() {
        return Err(Error::integrity(
            pinned.id(),
            format!("expected sha256 {}, got {}", pinned.digest(), actual),
        ));
    }
    Ok(())
}
