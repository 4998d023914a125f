//! Transfer records, failures and batch reports

use crate::inventory::FileEntry;
use crate::preview::PreviewBlock;
use crate::store::RemoteObject;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of transfers in flight per batch
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// A unit of work the pool can schedule.
pub trait TransferUnit {
    /// Identifying text used in failure reports and logs
    fn label(&self) -> String;

    /// Amount credited to the batch progress when the unit succeeds
    fn weight(&self) -> u64;
}

impl TransferUnit for FileEntry {
    fn label(&self) -> String {
        self.relative_path.clone()
    }

    fn weight(&self) -> u64 {
        self.size_bytes
    }
}

impl TransferUnit for RemoteObject {
    fn label(&self) -> String {
        self.key.clone()
    }

    fn weight(&self) -> u64 {
        self.size_bytes
    }
}

/// A file entry as recorded on a dataset by the metadata API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    /// Human-formatted size as stored by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(rename = "ossUrl", default, skip_serializing_if = "Option::is_none")]
    pub oss_url: Option<String>,
}

impl FileDescriptor {
    /// Public URL, when the descriptor carries a non-empty one
    pub fn url(&self) -> Option<&str> {
        self.oss_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Local placement path: the declared path, else the name
    pub fn relative_path(&self) -> &str {
        if self.path.is_empty() {
            &self.name
        } else {
            &self.path
        }
    }
}

/// URL downloads have no reliable byte total, so each file counts as one unit.
impl TransferUnit for FileDescriptor {
    fn label(&self) -> String {
        self.relative_path().to_string()
    }

    fn weight(&self) -> u64 {
        1
    }
}

/// Proof of one completed upload, sent to the metadata API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub name: String,
    pub path: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub url: String,
    #[serde(rename = "previewData", default, skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<PreviewBlock>,
}

/// Body of `POST /datasets/{id}/upload-complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteRequest {
    pub files: Vec<UploadedFileRecord>,
    pub total_size: u64,
}

/// A unit that failed inside the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferFailure {
    pub item: String,
    pub error: String,
}

/// Preview extraction counts for one upload batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreviewSummary {
    /// Preview-capable files found in the folder
    pub candidates: usize,
    /// Candidates that uploaded and had extraction attempted
    pub attempted: usize,
    pub extracted: usize,
    pub capability_available: bool,
}

impl PreviewSummary {
    pub fn failed(&self) -> usize {
        self.attempted.saturating_sub(self.extracted)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Successful uploads in completion order
    pub records: Vec<UploadedFileRecord>,
    pub failures: Vec<TransferFailure>,
    /// Sum of sizes of every file the inventory found
    pub discovered_bytes: u64,
    pub preview: PreviewSummary,
}

impl UploadReport {
    pub fn uploaded_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Completion payload built from successes only.
    pub fn completion_request(&self) -> UploadCompleteRequest {
        UploadCompleteRequest {
            files: self.records.clone(),
            total_size: self.uploaded_bytes(),
        }
    }
}

/// A file written by a download batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub local_path: PathBuf,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Written files in completion order
    pub completed: Vec<DownloadedFile>,
    pub failures: Vec<TransferFailure>,
    /// Progress total: bytes for prefix downloads, file count for URL lists
    pub total: u64,
}

impl DownloadReport {
    pub fn bytes_written(&self) -> u64 {
        self.completed.iter().map(|f| f.bytes_written).sum()
    }
}
