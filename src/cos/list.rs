//! COS prefix listing with marker pagination

use super::types::sdk_error;
use crate::error::Result;
use crate::store::{RemoteObject, MAX_KEYS_PER_REQUEST};
use aws_sdk_s3::Client;
use log::debug;

/// Marker for the next page, or `None` when listing is finished.
///
/// The store's truncation flag is not trusted on its own: a full page also
/// means more may follow, and an empty page always ends the listing.
pub(crate) fn next_page_marker(
    returned: usize,
    truncated: Option<bool>,
    next_marker: Option<&str>,
    last_key: Option<&str>,
) -> Option<String> {
    if returned == 0 {
        return None;
    }
    let more = truncated == Some(true) || returned >= MAX_KEYS_PER_REQUEST;
    if !more {
        return None;
    }
    next_marker
        .filter(|m| !m.is_empty())
        .or(last_key)
        .map(|m| m.to_string())
}

/// List every object under `prefix`, skipping directory markers
pub async fn list_objects_by_prefix(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<RemoteObject>> {
    let mut all_objects: Vec<RemoteObject> = Vec::new();
    let mut marker: Option<String> = None;
    let mut page_count = 0;

    loop {
        let mut request = client
            .list_objects()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(MAX_KEYS_PER_REQUEST as i32);

        if let Some(m) = &marker {
            request = request.marker(m);
        }

        let response = request.send().await.map_err(sdk_error)?;
        page_count += 1;

        let contents = response.contents();
        let last_key = contents.last().and_then(|obj| obj.key());

        let objects = contents.iter().filter_map(|obj| {
            let key = obj.key()?.to_string();
            // Skip directory markers
            if key.ends_with('/') {
                return None;
            }
            Some(RemoteObject {
                key,
                size_bytes: obj.size().unwrap_or(0).max(0) as u64,
            })
        });
        all_objects.extend(objects);

        let next = next_page_marker(
            contents.len(),
            response.is_truncated(),
            response.next_marker(),
            last_key,
        );

        match next {
            // Same marker twice would loop forever
            Some(m) if marker.as_deref() != Some(m.as_str()) => marker = Some(m),
            _ => break,
        }
    }

    debug!(
        "cos_list: prefix={} pages={} objects={}",
        prefix,
        page_count,
        all_objects.len()
    );

    Ok(all_objects)
}
