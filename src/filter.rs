//! Path filter deciding which files take part in a transfer
//!
//! Version-control metadata, caches, virtual environments, IDE folders and OS
//! litter never leave the machine. Matching is plain string comparison on path
//! segments and file names; `*` patterns are suffix checks, not globs.

use std::path::Path;

/// Directory or file names ignored anywhere in a relative path.
/// Entries starting with `*` are matched as file-name suffixes.
pub const IGNORE_PATTERNS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Python
    "__pycache__",
    ".pytest_cache",
    "*.pyc",
    "*.pyo",
    ".eggs",
    "*.egg-info",
    ".venv",
    "venv",
    // IDE
    ".idea",
    ".vscode",
    // OS
    ".DS_Store",
    "Thumbs.db",
    // Temp files
    "*.tmp",
    "*.temp",
    "*.swp",
    "*.swo",
];

/// Exact file names that are never uploaded
pub const IGNORE_FILES: &[&str] = &[
    ".gitignore",
    ".gitattributes",
    ".gitmodules",
    ".DS_Store",
    "Thumbs.db",
    ".env",
    ".env.local",
];

/// True when the file at `absolute_path` (relative path `relative_path` from
/// the transfer root) must be skipped.
pub fn should_ignore(absolute_path: &Path, relative_path: &str) -> bool {
    let segments = relative_path.split('/').filter(|s| !s.is_empty());
    for segment in segments {
        if segment.starts_with(".git") || IGNORE_PATTERNS.contains(&segment) {
            return true;
        }
    }

    let file_name = match absolute_path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => relative_path.rsplit('/').next().unwrap_or(relative_path),
    };

    if IGNORE_FILES.contains(&file_name) {
        return true;
    }

    IGNORE_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.strip_prefix('*'))
        .any(|suffix| file_name.ends_with(suffix))
}
