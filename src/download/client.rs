//! HTTP client wrapper for URL validation and streaming downloads.
//!
//! This module provides the `HttpClient` struct which validates URLs,
//! opens streaming GET requests, and writes response bodies to disk in
//! fixed-size chunks.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use super::progress::FileProgress;

const USER_AGENT: &str = concat!("dsputils/", env!("CARGO_PKG_VERSION"));

/// Answer of [`HttpClient::validate_url`] for a usable URL.
#[derive(Debug)]
pub enum UrlStatus {
    /// Syntax is valid; reachability was not checked.
    Valid,
    /// The server answered with a success status; the body is still unread.
    Reachable(Response),
}

/// HTTP client for validating and downloading URLs.
///
/// Built once per run and shared between downloads so connections are
/// pooled. The timeout applies to connecting and to each read, not to
/// the whole transfer.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client with the given connect/read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the TLS backend or system
    /// configuration prevents building the client.
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DownloadError::client)?;
        Ok(Self { client, timeout })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks a URL's syntax and, when `accessible` is set, its reachability.
    ///
    /// Reachability is checked with a single streaming GET whose response is
    /// handed back so the body can be downloaded without a second request.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] for malformed or non-HTTP(S) URLs
    /// - [`DownloadError::Network`] / [`DownloadError::Timeout`] when the request fails
    /// - [`DownloadError::HttpStatus`] for 4xx/5xx answers
    #[instrument(skip(self), fields(url = %url))]
    pub async fn validate_url(
        &self,
        url: &str,
        accessible: bool,
    ) -> Result<UrlStatus, DownloadError> {
        let parsed = parse_http_url(url)?;
        if !accessible {
            return Ok(UrlStatus::Valid);
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        debug!(status = status.as_u16(), "url reachable");
        Ok(UrlStatus::Reachable(response))
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Returns true for absolute `http`/`https` URLs with a host.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    parse_http_url(url).is_ok()
}

fn parse_http_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());
    if !matches!(parsed.scheme(), "http" | "https") || !has_host {
        return Err(DownloadError::invalid_url(url));
    }
    Ok(parsed)
}

/// Content-Length as declared by the server, if any.
pub(crate) fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Raw Content-Disposition header value, if any.
pub(crate) fn content_disposition(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
}

/// Streams the response body to `file`, writing `chunk_size` bytes at a time.
///
/// Returns the number of bytes written.
pub(crate) async fn stream_to_file(
    response: Response,
    file: File,
    chunk_size: usize,
    progress: &FileProgress,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let chunk_size = chunk_size.max(1);
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        for piece in chunk.chunks(chunk_size) {
            writer
                .write_all(piece)
                .await
                .map_err(|e| DownloadError::io(file_path, e))?;
            progress.advance(piece.len() as u64);
            bytes_written += piece.len() as u64;
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
