//! Dataset client library: folder inventory, bounded transfers to and from
//! COS object storage, Parquet previews and the metadata API client.

pub mod api;
pub mod config;
pub mod cos;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod preview;
pub mod progress;
pub mod store;
pub mod transfer;

pub use error::{DataHubError, Result};
