//! COS object operations (head, batch delete)

use super::types::sdk_error;
use crate::error::{DataHubError, Result};
use crate::store::MAX_KEYS_PER_REQUEST;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use log::info;

/// Size of an object in bytes, from a HEAD request
pub async fn head_object_size(client: &Client, bucket: &str, key: &str) -> Result<u64> {
    let response = client
        .head_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(response.content_length().unwrap_or(0).max(0) as u64)
}

/// Delete objects in batches of at most 1000 keys (quiet mode)
pub async fn delete_objects(client: &Client, bucket: &str, keys: &[String]) -> Result<()> {
    if keys.is_empty() {
        return Ok(());
    }

    for batch in keys.chunks(MAX_KEYS_PER_REQUEST) {
        let objects = batch
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| DataHubError::storage(e))
            })
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| DataHubError::storage(e))?;

        client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(sdk_error)?;

        info!("cos_delete_batch: bucket={} keys={}", bucket, batch.len());
    }

    Ok(())
}
