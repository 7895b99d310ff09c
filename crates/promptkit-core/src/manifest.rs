//! Build manifests
//!
//! One text file per platform under `.promptkit/manifests/` listing the
//! output paths written by the last build. Only listed paths are ever
//! deleted, so user files in the same output directory survive rebuilds.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::fs_util;
use crate::platform::Platform;

const MANIFEST_EXTENSION: &str = "txt";
const MANIFEST_HEADER: &str = "# Managed by promptkit. Do not edit.";

pub struct ManifestTracker {
    managed_dir: PathBuf,
}

impl ManifestTracker {
    pub fn new(managed_dir: PathBuf) -> Self {
        Self { managed_dir }
    }

    pub fn manifest_path(&self, platform: Platform) -> PathBuf {
        self.managed_dir
            .join(format!("{}.{}", platform.manifest_name(), MANIFEST_EXTENSION))
    }

    /// Paths recorded for `platform`; empty if it was never built
    pub fn read(&self, platform: Platform) -> Result<Vec<String>> {
        let path = self.manifest_path(platform);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect())
    }

    /// Replace the manifest for `platform`
    pub fn write(&self, platform: Platform, paths: &[String]) -> Result<()> {
        fs::create_dir_all(&self.managed_dir)?;

        let unique: BTreeSet<&str> = paths.iter().map(String::as_str).collect();
        let mut content = String::from(MANIFEST_HEADER);
        content.push('\n');
        for path in unique {
            content.push_str(path);
            content.push('\n');
        }

        fs::write(self.manifest_path(platform), content)?;
        Ok(())
    }

    /// Delete previously written files under `output_dir`, then prune
    /// directories left empty. Returns how many files were removed.
    pub fn cleanup(&self, output_dir: &Path, paths: &[String]) -> Result<usize> {
        let mut removed = 0;

        for relative in paths {
            let target = output_dir.join(relative);
            match fs::remove_file(&target) {
                Ok(()) => {
                    removed += 1;
                    debug!(path = %target.display(), "removed managed file");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            if let Some(parent) = target.parent() {
                fs_util::remove_empty_parents(parent, output_dir);
            }
        }

        Ok(removed)
    }

    /// Delete the manifest for `platform`. Returns whether one existed.
    pub fn remove(&self, platform: Platform) -> Result<bool> {
        let path = self.manifest_path(platform);
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// Platforms that currently have a manifest
    pub fn list_platforms(&self) -> Result<Vec<Platform>> {
        if !self.managed_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut platforms = Vec::new();
        for entry in fs::read_dir(&self.managed_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MANIFEST_EXTENSION) {
                continue;
            }
            if let Some(platform) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(Platform::from_manifest_name)
            {
                platforms.push(platform);
            }
        }
        platforms.sort();
        Ok(platforms)
    }
}
