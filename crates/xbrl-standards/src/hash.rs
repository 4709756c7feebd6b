#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use sha2::Digest;

use crate::error::StandardsError;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Recursively lists regular files under `root`, sorted by path.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, StandardsError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| StandardsError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StandardsError::io(&dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Content hash of a taxonomy directory.
///
/// SHA-256 over the sorted `relative/path\tsha256\n` lines of every file.
pub fn taxonomy_hash(root: &Path) -> Result<String, StandardsError> {
    let mut lines: Vec<String> = Vec::new();
    for path in list_files(root)? {
        let bytes = std::fs::read(&path).map_err(|e| StandardsError::io(&path, e))?;
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        lines.push(format!("{relative}\t{}\n", sha256_hex(&bytes)));
    }
    lines.sort();
    Ok(sha256_hex(lines.concat().as_bytes()))
}
