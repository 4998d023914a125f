//! Download flows: by dataset prefix through the object store, or by public URL

use super::pool::run_bounded;
use super::types::{DownloadReport, DownloadedFile, FileDescriptor};
use crate::error::{DataHubError, Result};
use crate::progress::{ProgressSink, TransferProgress};
use crate::store::{dataset_prefix, HttpSource, ObjectStore, RemoteObject};
use log::info;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Join a remote relative path under `root`, rejecting anything that would
/// land outside it.
pub(crate) fn safe_join(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DataHubError::Validation(format!(
                    "Refusing to write outside the output folder: {}",
                    relative
                )));
            }
        }
    }

    if depth == 0 {
        return Err(DataHubError::Validation(format!(
            "Empty relative path: {:?}",
            relative
        )));
    }
    Ok(joined)
}

/// Download every object under `datasets/{dataset_id}/` into `output`.
///
/// Local paths mirror the key with the prefix stripped. Fails with
/// `NotFound` when the listing is empty; per-object failures land in the report.
pub async fn download_by_prefix(
    store: Arc<dyn ObjectStore>,
    dataset_id: &str,
    output: &Path,
    max_workers: usize,
    sink: Arc<dyn ProgressSink>,
) -> Result<DownloadReport> {
    let prefix = dataset_prefix(dataset_id);
    let objects: Vec<RemoteObject> = store
        .list_objects(&prefix)
        .await?
        .into_iter()
        .filter(|obj| obj.relative_to(&prefix).is_some())
        .collect();

    if objects.is_empty() {
        return Err(DataHubError::NotFound(format!(
            "No files found for dataset '{}'",
            dataset_id
        )));
    }

    let total: u64 = objects.iter().map(|o| o.size_bytes).sum();
    info!(
        "download_start: dataset={} objects={} bytes={}",
        dataset_id,
        objects.len(),
        total
    );

    let progress = Arc::new(TransferProgress::new(total, sink));
    let output = output.to_path_buf();

    let outcome = run_bounded(objects, max_workers, progress, move |object: RemoteObject| {
        let store = store.clone();
        let prefix = prefix.clone();
        let output = output.clone();
        async move {
            let relative = object.relative_to(&prefix).unwrap_or(object.key.as_str());
            let local_path = safe_join(&output, relative)?;
            let bytes_written = store.get_object(&object.key, &local_path).await?;
            Ok(DownloadedFile {
                local_path,
                bytes_written,
            })
        }
    })
    .await;

    info!(
        "download_done: ok={} failed={}",
        outcome.successes.len(),
        outcome.failures.len()
    );

    Ok(DownloadReport {
        completed: outcome.successes,
        failures: outcome.failures,
        total,
    })
}

/// Download files by their public URL into `output`, one progress unit per file.
///
/// Descriptors without a URL are skipped; fails with `Validation` when none
/// remain.
pub async fn download_by_url_list(
    http: Arc<dyn HttpSource>,
    files: Vec<FileDescriptor>,
    output: &Path,
    max_workers: usize,
    sink: Arc<dyn ProgressSink>,
) -> Result<DownloadReport> {
    let downloadable: Vec<FileDescriptor> =
        files.into_iter().filter(|f| f.url().is_some()).collect();

    if downloadable.is_empty() {
        return Err(DataHubError::Validation(
            "No downloadable files found. Files may not have public URLs".to_string(),
        ));
    }

    let total = downloadable.len() as u64;
    info!("download_http_start: files={}", total);

    let progress = Arc::new(TransferProgress::new(total, sink));
    let output = output.to_path_buf();

    let outcome = run_bounded(downloadable, max_workers, progress, move |file: FileDescriptor| {
        let http = http.clone();
        let output = output.clone();
        async move {
            let local_path = safe_join(&output, file.relative_path())?;
            let url = file.url().unwrap_or_default();
            let bytes_written = http.get_object_http(url, &local_path).await?;
            Ok(DownloadedFile {
                local_path,
                bytes_written,
            })
        }
    })
    .await;

    info!(
        "download_http_done: ok={} failed={}",
        outcome.successes.len(),
        outcome.failures.len()
    );

    Ok(DownloadReport {
        completed: outcome.successes,
        failures: outcome.failures,
        total,
    })
}
