use serde::{Deserialize, Serialize};

/// Classification of a stored resource, persisted as `"notebook"` / `"file"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Notebook,
    File,
}

/// Strips the leading and trailing slashes clients may include in a resource
/// path. Interior slashes are significant and preserved.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Final `/`-delimited segment of a path, used as the displayed name.
pub fn display_name(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}

/// Whether any segment of the path is the literal `files`. Such paths belong
/// to the file-serving route even when no notebook record exists for them.
pub fn has_files_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment == "files")
}
