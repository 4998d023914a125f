//! Local inventory: walk a folder and keep the files that pass the path filter

use crate::error::{DataHubError, Result};
use crate::filter::should_ignore;
use log::{debug, warn};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A local file selected for transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    /// `/`-separated path relative to the transfer root
    pub relative_path: String,
    pub size_bytes: u64,
}

impl FileEntry {
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// Result of scanning a folder: files to transfer and relative paths skipped by the filter
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub files: Vec<FileEntry>,
    pub ignored: Vec<String>,
    /// Entries below the root that could not be read and were left out
    pub unreadable: Vec<String>,
}

impl Inventory {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

/// Collect the files under `root` that should be transferred.
///
/// Order follows the directory walk and is not sorted.
pub fn collect(root: &Path) -> Result<Vec<FileEntry>> {
    Ok(scan(root)?.files)
}

/// Walk `root` recursively, splitting regular files into kept and ignored.
///
/// Entries below the root that cannot be read are logged, listed in
/// [`Inventory::unreadable`] and skipped. Only a missing or unlistable root fails.
pub fn scan(root: &Path) -> Result<Inventory> {
    let root = match std::fs::canonicalize(root) {
        Ok(path) => path,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DataHubError::NotFound(format!(
                "Folder does not exist: {}",
                root.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    if !root.is_dir() {
        return Err(DataHubError::Validation(format!(
            "Not a directory: {}",
            root.display()
        )));
    }

    let steps = WalkDir::new(&root)
        .min_depth(1)
        .into_iter()
        .map(|entry| match entry {
            Ok(entry) => WalkStep::Entry(entry.into_path()),
            Err(e) => WalkStep::Failed {
                path: e.path().map(Path::to_path_buf),
                depth: e.depth(),
                error: e.into(),
            },
        });
    let inventory = absorb(&root, steps)?;

    debug!(
        "inventory_scan: {} kept={} ignored={} unreadable={}",
        root.display(),
        inventory.files.len(),
        inventory.ignored.len(),
        inventory.unreadable.len()
    );

    Ok(inventory)
}

/// One item of a directory walk
#[derive(Debug)]
enum WalkStep {
    Entry(PathBuf),
    Failed {
        path: Option<PathBuf>,
        depth: usize,
        error: DataHubError,
    },
}

fn absorb<I>(root: &Path, steps: I) -> Result<Inventory>
where
    I: IntoIterator<Item = WalkStep>,
{
    let mut inventory = Inventory::default();

    for step in steps {
        let path = match step {
            WalkStep::Entry(path) => path,
            // The root itself could not be listed
            WalkStep::Failed { depth: 0, error, .. } => return Err(error),
            WalkStep::Failed { path, error, .. } => {
                let shown = match path {
                    Some(path) => relative_display(root, &path),
                    None => root.display().to_string(),
                };
                warn!("inventory_unreadable: {} error={}", shown, error);
                inventory.unreadable.push(shown);
                continue;
            }
        };

        let relative_path = match path.strip_prefix(root) {
            Ok(rel) => to_posix(rel),
            Err(_) => continue,
        };

        // Follows symlinks, so a link counts when it resolves to a regular file
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("inventory_unreadable: {} error={}", relative_path, e);
                inventory.unreadable.push(relative_path);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        if should_ignore(&path, &relative_path) {
            debug!("inventory_ignore: {}", relative_path);
            inventory.ignored.push(relative_path);
            continue;
        }

        inventory.files.push(FileEntry {
            absolute_path: path,
            relative_path,
            size_bytes: metadata.len(),
        });
    }

    Ok(inventory)
}

fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => to_posix(rel),
        Err(_) => path.display().to_string(),
    }
}

fn to_posix(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
