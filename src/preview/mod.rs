//! Content preview for Parquet files
//!
//! Samples a bounded number of rows and columns from a Parquet file and turns
//! them into JSON-safe values that can be stored next to the upload metadata.
//! The capability is optional: builds without the `parquet-preview` feature get
//! `None` from [`Previewer::detect`] and uploads carry no preview.

#[cfg(feature = "parquet-preview")]
mod parquet;
pub mod value;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const DEFAULT_MAX_ROWS: usize = 100;
pub const DEFAULT_MAX_COLUMNS: usize = 50;

/// Bounded sample of a structured file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBlock {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    /// Row count of the whole file, not of the sample
    pub total_rows: u64,
}

/// Case-insensitive `.parquet` extension check
pub fn is_preview_candidate(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false)
}

/// Resolved preview capability with its sampling limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Previewer {
    pub max_rows: usize,
    pub max_columns: usize,
}

impl Default for Previewer {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}

impl Previewer {
    /// The capability when this build can decode Parquet.
    pub fn detect() -> Option<Self> {
        if cfg!(feature = "parquet-preview") {
            Some(Self::default())
        } else {
            None
        }
    }

    pub fn with_limits(max_rows: usize, max_columns: usize) -> Self {
        Self {
            max_rows,
            max_columns,
        }
    }

    /// Extract a preview; any failure is logged and yields `None`.
    pub fn extract(&self, path: &Path) -> Option<PreviewBlock> {
        extract_preview(path, self.max_rows, self.max_columns)
    }
}

#[cfg(feature = "parquet-preview")]
pub fn extract_preview(path: &Path, max_rows: usize, max_columns: usize) -> Option<PreviewBlock> {
    match parquet::read_preview(path, max_rows, max_columns) {
        Ok(block) => Some(block),
        Err(e) => {
            warn!("preview_failed: {} error={}", path.display(), e);
            None
        }
    }
}

#[cfg(not(feature = "parquet-preview"))]
pub fn extract_preview(path: &Path, _max_rows: usize, _max_columns: usize) -> Option<PreviewBlock> {
    warn!("preview_unavailable: {}", path.display());
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_check_ignores_case() {
        assert!(is_preview_candidate(Path::new("data/chunk-000/episode_000000.parquet")));
        assert!(is_preview_candidate(Path::new("DATA.PARQUET")));
        assert!(!is_preview_candidate(Path::new("data.parquet.bak")));
        assert!(!is_preview_candidate(Path::new("parquet")));
    }

    #[test]
    fn preview_block_serializes_camel_case() {
        let block = PreviewBlock {
            columns: vec!["a".into()],
            rows: vec![],
            total_rows: 10,
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["totalRows"], 10);
    }

    #[test]
    fn unreadable_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.parquet");
        std::fs::write(&path, b"not a parquet file").unwrap();
        assert_eq!(Previewer::default().extract(&path), None);
    }
}
