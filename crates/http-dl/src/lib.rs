//! Streaming HTTP download engine
//!
//! Fetches a URL with a single GET and streams the body into a local file
//! through a fixed-size write buffer. The number of bytes written is counted
//! from the body itself, so a missing or wrong `Content-Length` header does not
//! affect the reported size.

use futures_util::StreamExt;
use log::{debug, warn};
use reqwest::Client;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Write chunk size for streamed bodies (8 KB)
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Per-request timeout used by [`Downloader::with_default_timeout`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub enum DownloadError {
    /// Server answered with a non-success status
    Status { status: u16, url: String },
    /// Request could not be sent or the body stream broke
    Request(reqwest::Error),
    /// Local file could not be created or written
    Io(std::io::Error),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Status { status, url } => {
                write!(f, "HTTP {} while downloading {}", status, url)
            }
            DownloadError::Request(e) => write!(f, "Download request failed: {}", e),
            DownloadError::Io(e) => write!(f, "Failed to write file: {}", e),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::Status { .. } => None,
            DownloadError::Request(e) => Some(e),
            DownloadError::Io(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        DownloadError::Request(e)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        DownloadError::Io(e)
    }
}

/// HTTP downloader sharing one connection pool across calls
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self, DownloadError> {
        Self::new(DEFAULT_TIMEOUT)
    }

    /// Download `url` into `destination`, creating parent directories first.
    ///
    /// Returns the number of body bytes written.
    pub async fn fetch_to_file(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let declared = response.content_length();
        let file = File::create(destination).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        writer.flush().await?;

        match declared {
            Some(expected) if expected != downloaded => warn!(
                "http_download_length_mismatch: {} declared={} received={}",
                url, expected, downloaded
            ),
            _ => debug!("http_download_finish: {} bytes={}", url, downloaded),
        }

        Ok(downloaded)
    }
}
