//! Metadata API module
//!
//! - `client`: Authenticated JSON client for auth and dataset endpoints
//! - `types`: Dataset records and request bodies

mod client;
mod types;

pub use client::{ApiClient, API_TIMEOUT};
pub use types::{slugify, DatasetFile, DatasetSummary, NewDataset};
