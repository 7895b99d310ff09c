//! File tree helpers shared by the resolvers, the cache and the builders.
//!
//! Relative paths handed around the pipeline are always `/`-separated
//! strings so that lock hashes and manifests are identical across platforms.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};

use walkdir::WalkDir;

const GIT_DIR: &str = ".git";

/// Convert a relative path into a `/`-separated string
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// List every regular file under `root`, recursively, as sorted paths
/// relative to `root`. A missing directory yields an empty list.
pub fn list_files(root: &Path) -> io::Result<Vec<String>> {
    list_files_relative_to(root, root)
}

/// List every regular file under `dir`, with paths relative to `base`.
///
/// `dir` must live inside `base`.
pub fn list_files_relative_to(dir: &Path, base: &Path) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(base)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        files.push(to_slash_path(relative));
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Copy a single file, creating parent directories and carrying the
/// modification time over where the platform allows it.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;

    // fs::copy keeps permissions but not timestamps
    if let Ok(modified) = fs::metadata(src).and_then(|m| m.modified()) {
        let _ = File::options()
            .write(true)
            .open(dst)
            .and_then(|f| f.set_modified(modified));
    }

    Ok(())
}

/// Copy every regular file under `src` into `dst`, preserving structure.
/// `.git` directories are skipped.
pub fn copy_dir(src: &Path, dst: &Path) -> io::Result<usize> {
    let mut copied = 0;

    let walker = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != GIT_DIR);

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        copy_file(entry.path(), &dst.join(relative))?;
        copied += 1;
    }

    Ok(copied)
}

/// Remove empty directories from `start` upward, stopping at the first
/// non-empty one or at `root` (which is never removed).
pub fn remove_empty_parents(start: &Path, root: &Path) {
    let mut current = Some(start);

    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty || fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
