//! Upload-folder flow

use super::pool::run_bounded;
use super::types::{PreviewSummary, UploadReport, UploadedFileRecord};
use crate::error::Result;
use crate::inventory::{self, FileEntry};
use crate::preview::{is_preview_candidate, Previewer};
use crate::progress::{ProgressSink, TransferProgress};
use crate::store::{dataset_key, ObjectStore};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// Upload every file under `root` to `datasets/{dataset_id}/`.
///
/// Files are enumerated and totalled before any transfer starts. Individual
/// upload failures land in the report; only a missing or unlistable root is
/// returned as an error.
/// When `previewer` is set, Parquet files get a preview attached to their
/// record after a successful upload.
pub async fn upload_folder(
    store: Arc<dyn ObjectStore>,
    previewer: Option<Previewer>,
    root: &Path,
    dataset_id: &str,
    max_workers: usize,
    sink: Arc<dyn ProgressSink>,
) -> Result<UploadReport> {
    let scanned = inventory::scan(root)?;
    let discovered_bytes = scanned.total_bytes();
    if !scanned.unreadable.is_empty() {
        sink.message(&format!(
            "Skipped {} unreadable path(s): {}",
            scanned.unreadable.len(),
            scanned.unreadable.join(", ")
        ));
    }
    let files = scanned.files;
    let candidates = files
        .iter()
        .filter(|f| is_preview_candidate(&f.absolute_path))
        .count();

    info!(
        "upload_start: dataset={} files={} bytes={}",
        dataset_id,
        files.len(),
        discovered_bytes
    );

    if candidates > 0 && previewer.is_none() {
        warn!("preview_unavailable: {} parquet files will upload without preview", candidates);
        sink.message("Parquet preview support is not available; files upload without preview");
    }

    let progress = Arc::new(TransferProgress::new(discovered_bytes, sink.clone()));
    let dataset_id = dataset_id.to_string();

    let outcome = run_bounded(files, max_workers, progress, move |entry: FileEntry| {
        let store = store.clone();
        let dataset_id = dataset_id.clone();
        async move {
            let key = dataset_key(&dataset_id, &entry.relative_path);
            let url = store.put_object(&key, &entry.absolute_path).await?;

            let preview_data = match previewer {
                Some(previewer) if is_preview_candidate(&entry.absolute_path) => {
                    let path = entry.absolute_path.clone();
                    match tokio::task::spawn_blocking(move || previewer.extract(&path)).await {
                        Ok(preview) => preview,
                        Err(e) => {
                            warn!("preview_failed: {} error={}", entry.relative_path, e);
                            None
                        }
                    }
                }
                _ => None,
            };

            Ok(UploadedFileRecord {
                name: entry.file_name().to_string(),
                path: entry.relative_path.clone(),
                size_bytes: entry.size_bytes,
                url,
                preview_data,
            })
        }
    })
    .await;

    let attempted = if previewer.is_some() {
        outcome
            .successes
            .iter()
            .filter(|r| is_preview_candidate(Path::new(&r.path)))
            .count()
    } else {
        0
    };
    let preview = PreviewSummary {
        candidates,
        attempted,
        extracted: outcome
            .successes
            .iter()
            .filter(|r| r.preview_data.is_some())
            .count(),
        capability_available: previewer.is_some(),
    };

    if preview.attempted > 0 {
        sink.message(&format!(
            "Parquet previews: {} extracted, {} failed",
            preview.extracted,
            preview.failed()
        ));
    }

    info!(
        "upload_done: ok={} failed={}",
        outcome.successes.len(),
        outcome.failures.len()
    );

    Ok(UploadReport {
        records: outcome.successes,
        failures: outcome.failures,
        discovered_bytes,
        preview,
    })
}
