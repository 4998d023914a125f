//! COS download operations

use super::objects::head_object_size;
use super::types::sdk_error;
use crate::error::{DataHubError, Result};
use crate::store::MULTIPART_THRESHOLD;
use aws_sdk_s3::Client;
use log::debug;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Write buffer size for streamed downloads (2 MB)
const WRITE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Download `key` into `destination`; returns bytes written.
///
/// The object size is read first; large objects are streamed to disk chunk by
/// chunk, small ones are fetched whole and written once.
pub async fn get_object(client: &Client, bucket: &str, key: &str, destination: &Path) -> Result<u64> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let size = head_object_size(client, bucket, key).await?;

    let response = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(sdk_error)?;
    let mut body = response.body;

    if size > MULTIPART_THRESHOLD {
        let file = File::create(destination).await?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let mut written: u64 = 0;

        while let Some(chunk) = body.try_next().await.map_err(|e| DataHubError::storage(e))? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        debug!("cos_get_streamed: {} bytes={}", key, written);
        Ok(written)
    } else {
        let data = body
            .collect()
            .await
            .map_err(|e| DataHubError::storage(e))?
            .into_bytes();
        tokio::fs::write(destination, &data).await?;

        debug!("cos_get: {} bytes={}", key, data.len());
        Ok(data.len() as u64)
    }
}
