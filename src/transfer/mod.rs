//! Transfer module - bounded batch transfers between a folder and the object store
//!
//! This module is organized into submodules:
//! - `types`: Records, failures and batch reports
//! - `pool`: Semaphore-bounded worker pool with progress aggregation
//! - `upload`: Upload-folder flow with optional preview extraction
//! - `download`: Download by dataset prefix or by public URL list

mod download;
mod pool;
mod types;
mod upload;

pub use download::{download_by_prefix, download_by_url_list};
pub use pool::{run_bounded, BatchOutcome};
pub use types::{
    DownloadReport, DownloadedFile, FileDescriptor, PreviewSummary, TransferFailure,
    TransferUnit, UploadCompleteRequest, UploadReport, UploadedFileRecord, DEFAULT_MAX_WORKERS,
};
pub use upload::upload_folder;
