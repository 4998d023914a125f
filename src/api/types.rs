//! Dataset records as exchanged with the metadata API

use crate::transfer::FileDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// File entry attached to a dataset record
pub type DatasetFile = FileDescriptor;

/// Dataset record. Only the fields the client reads are typed; everything
/// else is kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Human-formatted total size
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub files: Vec<DatasetFile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatasetSummary {
    /// Loosely typed extra field rendered for display
    pub fn extra_text(&self, key: &str) -> String {
        match self.extra.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Body of `POST /datasets`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataset {
    pub id: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub dataset_format: String,
    pub robot_type: String,
    pub task_type: String,
    pub license: String,
    pub downloads: u64,
    pub likes: u64,
    pub tags: Vec<String>,
}

impl NewDataset {
    /// Record for `name` with its id derived by [`slugify`]
    pub fn named(name: &str, author: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            author: author.to_string(),
            description: String::new(),
            dataset_format: "lerobot".to_string(),
            robot_type: String::new(),
            task_type: String::new(),
            license: "MIT".to_string(),
            downloads: 0,
            likes: 0,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub token: String,
}

/// Dataset id from a display name: lowercase, spaces and underscores become
/// `-`, anything else that is not alphanumeric is dropped.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}
