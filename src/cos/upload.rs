//! COS upload operations (simple, multipart)

use super::types::sdk_error;
use crate::error::{DataHubError, Result};
use crate::store::MULTIPART_THRESHOLD;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::Semaphore;

/// Minimum part size for multipart uploads (8 MB)
const MIN_PART_SIZE: u64 = 8 * 1024 * 1024;
/// Upper bound on part count accepted by the store
const MAX_PARTS: u64 = 10_000;
/// Parts uploaded in parallel for a single file
const PART_CONCURRENCY: usize = 4;

/// Part size that keeps the part count within the store's limit
pub(crate) fn part_size_for(file_size: u64) -> u64 {
    let needed = file_size.div_ceil(MAX_PARTS);
    needed.max(MIN_PART_SIZE)
}

/// Upload a local file, choosing single PUT or multipart by size
pub async fn put_object(client: &Client, bucket: &str, key: &str, file_path: &Path) -> Result<()> {
    let file_size = tokio::fs::metadata(file_path).await?.len();

    if file_size > MULTIPART_THRESHOLD {
        upload_file_multipart(client, bucket, key, file_path, file_size).await
    } else {
        upload_file_simple(client, bucket, key, file_path).await
    }
}

/// Upload a file with a single PUT
pub async fn upload_file_simple(
    client: &Client,
    bucket: &str,
    key: &str,
    file_path: &Path,
) -> Result<()> {
    let body = ByteStream::from_path(file_path)
        .await
        .map_err(|e| DataHubError::storage(e))?;

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .send()
        .await
        .map_err(sdk_error)?;

    debug!("cos_put: {}", key);
    Ok(())
}

async fn initiate_multipart_upload(client: &Client, bucket: &str, key: &str) -> Result<String> {
    let response = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(sdk_error)?;

    response
        .upload_id()
        .map(|id| id.to_string())
        .ok_or_else(|| DataHubError::Storage("No upload ID returned".to_string()))
}

async fn upload_part(
    client: &Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    part_number: i32,
    data: Vec<u8>,
) -> Result<String> {
    let response = client
        .upload_part()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .part_number(part_number)
        .body(ByteStream::from(data))
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(response.e_tag().unwrap_or_default().to_string())
}

async fn complete_multipart_upload(
    client: &Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    parts: Vec<(i32, String)>, // (part_number, etag)
) -> Result<()> {
    let completed_parts: Vec<CompletedPart> = parts
        .into_iter()
        .map(|(part_number, etag)| {
            CompletedPart::builder()
                .part_number(part_number)
                .e_tag(etag)
                .build()
        })
        .collect();

    let completed_upload = CompletedMultipartUpload::builder()
        .set_parts(Some(completed_parts))
        .build();

    client
        .complete_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .multipart_upload(completed_upload)
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(())
}

async fn abort_multipart_upload(client: &Client, bucket: &str, key: &str, upload_id: &str) -> Result<()> {
    client
        .abort_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(())
}

async fn read_part(file_path: &Path, start: u64, len: u64) -> Result<Vec<u8>> {
    let mut file = File::open(file_path).await?;
    file.seek(SeekFrom::Start(start)).await?;
    let mut buffer = vec![0u8; len as usize];
    file.read_exact(&mut buffer).await?;
    Ok(buffer)
}

/// Upload a large file in parts; any failed part aborts the whole upload
pub async fn upload_file_multipart(
    client: &Client,
    bucket: &str,
    key: &str,
    file_path: &Path,
    file_size: u64,
) -> Result<()> {
    let part_size = part_size_for(file_size);
    let total_parts = file_size.div_ceil(part_size);
    let upload_id = initiate_multipart_upload(client, bucket, key).await?;

    debug!(
        "cos_multipart_start: {} size={} parts={}",
        key, file_size, total_parts
    );

    let semaphore = Arc::new(Semaphore::new(PART_CONCURRENCY));
    let mut handles = Vec::with_capacity(total_parts as usize);

    for part_number in 1..=total_parts {
        let semaphore = semaphore.clone();
        let client = client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();
        let upload_id = upload_id.clone();
        let file_path: PathBuf = file_path.to_path_buf();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| DataHubError::storage(e))?;

            let start = (part_number - 1) * part_size;
            let end = std::cmp::min(start + part_size, file_size);
            let buffer = read_part(&file_path, start, end - start).await?;

            let etag = upload_part(
                &client,
                &bucket,
                &key,
                &upload_id,
                part_number as i32,
                buffer,
            )
            .await?;

            Ok::<(i32, String), DataHubError>((part_number as i32, etag))
        }));
    }

    let mut parts = Vec::with_capacity(handles.len());
    let mut first_error: Option<DataHubError> = None;

    for handle in handles {
        match handle.await {
            Ok(Ok(part)) => parts.push(part),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(DataHubError::Storage(format!("Part task failed: {}", e)));
            }
        }
    }

    if let Some(err) = first_error {
        if let Err(abort_err) = abort_multipart_upload(client, bucket, key, &upload_id).await {
            warn!("cos_multipart_abort_failed: {} error={}", key, abort_err);
        }
        return Err(err);
    }

    // Parts must be listed in ascending order
    parts.sort_by_key(|(n, _)| *n);
    complete_multipart_upload(client, bucket, key, &upload_id, parts).await
}
