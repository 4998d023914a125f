#![allow(dead_code)]

use async_trait::async_trait;
use datahub_lib::store::{HttpSource, ObjectStore, RemoteObject};
use datahub_lib::{DataHubError, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

pub const TEST_BUCKET: &str = "test-bucket-1250000000";
pub const TEST_HOST: &str = "cos.ap-shanghai.myqcloud.com";

/// In-memory object store; keys in `failing` error on put/get.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(keys: &[&str]) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            failing: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn insert(&self, key: &str, body: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), body);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, local_path: &Path) -> Result<String> {
        if self.failing.contains(key) {
            return Err(DataHubError::storage("connection reset by peer"));
        }
        let body = tokio::fs::read(local_path).await?;
        self.insert(key, body);
        Ok(self.public_url(key))
    }

    async fn get_object(&self, key: &str, local_path: &Path) -> Result<u64> {
        if self.failing.contains(key) {
            return Err(DataHubError::storage("connection reset by peer"));
        }
        let body = self
            .body(key)
            .ok_or_else(|| DataHubError::storage(format!("NoSuchKey: {}", key)))?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &body).await?;
        Ok(body.len() as u64)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<RemoteObject>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, body)| RemoteObject {
                key: key.clone(),
                size_bytes: body.len() as u64,
            })
            .collect())
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", TEST_BUCKET, TEST_HOST, key)
    }
}

/// HTTP source serving fixed bodies by URL
#[derive(Default)]
pub struct MemoryHttp {
    bodies: BTreeMap<String, Vec<u8>>,
}

impl MemoryHttp {
    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }
}

#[async_trait]
impl HttpSource for MemoryHttp {
    async fn get_object_http(&self, url: &str, local_path: &Path) -> Result<u64> {
        let body = self
            .bodies
            .get(url)
            .ok_or_else(|| DataHubError::Http(format!("HTTP 404 while downloading {}", url)))?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, body).await?;
        Ok(body.len() as u64)
    }
}

pub fn write_file(root: &Path, relative: &str, body: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

/// Parquet file with columns `id`, `label`, then `extra_columns` int columns,
/// written as one row group per entry of `row_groups`.
#[cfg(feature = "parquet-preview")]
pub fn write_parquet(path: &Path, row_groups: &[i64], extra_columns: usize) {
    use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;
    use std::sync::Arc;

    let mut message =
        String::from("message sample { REQUIRED INT64 id; REQUIRED BYTE_ARRAY label (UTF8);");
    for i in 0..extra_columns {
        message.push_str(&format!(" REQUIRED INT64 c{};", i));
    }
    message.push_str(" }");

    let schema = Arc::new(parse_message_type(&message).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = std::fs::File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    let mut start = 0i64;
    for &count in row_groups {
        let ids: Vec<i64> = (start..start + count).collect();
        let labels: Vec<ByteArray> = ids
            .iter()
            .map(|i| ByteArray::from(format!("row-{}", i).as_str()))
            .collect();

        let mut row_group = writer.next_row_group().unwrap();
        let mut index = 0usize;
        while let Some(mut column) = row_group.next_column().unwrap() {
            if index == 1 {
                column
                    .typed::<ByteArrayType>()
                    .write_batch(&labels, None, None)
                    .unwrap();
            } else {
                column
                    .typed::<Int64Type>()
                    .write_batch(&ids, None, None)
                    .unwrap();
            }
            column.close().unwrap();
            index += 1;
        }
        row_group.close().unwrap();
        start += count;
    }
    writer.close().unwrap();
}
