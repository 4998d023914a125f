//! Object store gateway traits.
//!
//! The transfer orchestrators talk to storage only through these traits so the
//! COS-backed implementation can be swapped for in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Objects larger than this use multipart upload / streamed download (20 MB)
pub const MULTIPART_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Maximum keys per listing page and per batch delete request
pub const MAX_KEYS_PER_REQUEST: usize = 1000;

/// An object returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Full object key, including the dataset prefix
    pub key: String,
    pub size_bytes: u64,
}

impl RemoteObject {
    /// Key with `prefix` removed, or `None` when the key lies outside it
    pub fn relative_to<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        self.key.strip_prefix(prefix).filter(|rest| !rest.is_empty())
    }
}

/// Bucket-bound object storage operations
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`; returns the object's public URL
    async fn put_object(&self, key: &str, local_path: &Path) -> Result<String>;

    /// Download `key` into `local_path`, creating parent directories; returns bytes written
    async fn get_object(&self, key: &str, local_path: &Path) -> Result<u64>;

    /// List every object whose key starts with `prefix`
    async fn list_objects(&self, prefix: &str) -> Result<Vec<RemoteObject>>;

    /// Delete the given keys; empty input is a no-op
    async fn delete_objects(&self, keys: &[String]) -> Result<()>;

    /// Public URL an object would be served from
    fn public_url(&self, key: &str) -> String;
}

/// Plain HTTP(S) source for publicly readable objects
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Stream `url` into `local_path`; returns bytes written
    async fn get_object_http(&self, url: &str, local_path: &Path) -> Result<u64>;
}

#[async_trait]
impl HttpSource for http_dl::Downloader {
    async fn get_object_http(&self, url: &str, local_path: &Path) -> Result<u64> {
        Ok(self.fetch_to_file(url, local_path).await?)
    }
}

/// Key prefix holding every object of a dataset
pub fn dataset_prefix(dataset_id: &str) -> String {
    format!("datasets/{}/", dataset_id)
}

/// Object key for a file at `relative_path` inside a dataset
pub fn dataset_key(dataset_id: &str, relative_path: &str) -> String {
    format!("{}{}", dataset_prefix(dataset_id), relative_path)
}
