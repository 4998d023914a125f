//! COS module - object storage operations over the S3-compatible API
//!
//! This module is organized into submodules:
//! - `types`: Client creation and public URL shape
//! - `list`: Prefix listing with marker pagination
//! - `objects`: Head and batch delete
//! - `upload`: Upload operations (simple, multipart)
//! - `download`: Download operations (whole body, streamed)

mod download;
mod list;
mod objects;
mod types;
mod upload;

pub use download::get_object;
pub use list::list_objects_by_prefix;
pub use objects::{delete_objects, head_object_size};
pub use types::{create_cos_client, create_cos_client_at, public_object_url};
pub use upload::{put_object, upload_file_multipart, upload_file_simple};

use crate::config::CosConfig;
use crate::error::Result;
use crate::store::{HttpSource, ObjectStore, RemoteObject};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use http_dl::Downloader;
use std::path::Path;

/// Bucket-bound COS gateway
#[derive(Debug, Clone)]
pub struct CosStore {
    client: Client,
    bucket: String,
    endpoint_host: String,
    http: Downloader,
}

impl CosStore {
    /// Build the gateway; fails with a configuration error before any network call
    /// when credentials or bucket are missing.
    pub fn new(config: &CosConfig) -> Result<Self> {
        Self::from_client(config, create_cos_client(config)?)
    }

    /// Gateway talking path-style to `endpoint_url`; public URLs keep the
    /// configured endpoint host.
    pub fn with_endpoint(config: &CosConfig, endpoint_url: &str) -> Result<Self> {
        Self::from_client(config, create_cos_client_at(config, endpoint_url, true)?)
    }

    fn from_client(config: &CosConfig, client: Client) -> Result<Self> {
        let http = Downloader::with_default_timeout()?;
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            endpoint_host: config.endpoint_host.clone(),
            http,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for CosStore {
    async fn put_object(&self, key: &str, local_path: &Path) -> Result<String> {
        put_object(&self.client, &self.bucket, key, local_path).await?;
        Ok(self.public_url(key))
    }

    async fn get_object(&self, key: &str, local_path: &Path) -> Result<u64> {
        get_object(&self.client, &self.bucket, key, local_path).await
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<RemoteObject>> {
        list_objects_by_prefix(&self.client, &self.bucket, prefix).await
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        delete_objects(&self.client, &self.bucket, keys).await
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.bucket, &self.endpoint_host, key)
    }
}

#[async_trait]
impl HttpSource for CosStore {
    async fn get_object_http(&self, url: &str, local_path: &Path) -> Result<u64> {
        self.http.get_object_http(url, local_path).await
    }
}
