//! Lock file
//!
//! `promptkit.lock` records which version of every plugin was last fetched:
//! the commit SHA for registry plugins, a content hash for local ones.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{PromptkitError, Result};
use crate::plugin::ResolvedPlugin;

pub const LOCK_FILENAME: &str = "promptkit.lock";
pub const LOCK_VERSION: u32 = 1;

const HASH_PREFIX: &str = "sha256:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub name: String,
    pub source: String,
    /// `sha256:<hex>` for local plugins, empty for registry plugins
    #[serde(rename = "hash")]
    pub content_hash: String,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl LockEntry {
    pub fn is_registry(&self) -> bool {
        self.commit_sha.is_some()
    }

    /// Whether `other` pins the same version of the plugin
    pub fn same_identity(&self, other: &LockEntry) -> bool {
        self.commit_sha == other.commit_sha && self.content_hash == other.content_hash
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub prompts: Vec<LockEntry>,
}

fn default_version() -> u32 {
    LOCK_VERSION
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: LOCK_VERSION,
            prompts: Vec::new(),
        }
    }
}

impl LockFile {
    pub fn new(prompts: Vec<LockEntry>) -> Self {
        Self {
            version: LOCK_VERSION,
            prompts,
        }
    }

    /// Read the lock file, failing if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PromptkitError::LockFileNotFound);
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Read the lock file, treating a missing file as empty
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PromptkitError::validation(format!("Invalid lock file: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Entries keyed by source, for reconciliation
    pub fn by_source(&self) -> HashMap<String, LockEntry> {
        self.prompts
            .iter()
            .map(|e| (e.source.clone(), e.clone()))
            .collect()
    }

    pub fn find_by_source(&self, source: &str) -> Option<&LockEntry> {
        self.prompts.iter().find(|e| e.source == source)
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// RFC 3339 timestamp; values without an offset are taken as UTC
pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("Invalid datetime: '{}'", raw))
}

/// Hash a local plugin's files.
///
/// Files are visited in lexicographic order; each contributes its relative
/// path, a NUL byte, then its full content, all fed to one SHA-256.
pub fn compute_content_hash(source_dir: &Path, files: &[String]) -> Result<String> {
    let mut sorted: Vec<&String> = files.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for relative in sorted {
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        let mut file = File::open(source_dir.join(relative))?;
        io::copy(&mut file, &mut hasher)?;
    }

    Ok(format!("{}{}", HASH_PREFIX, hex::encode(hasher.finalize())))
}

/// Turn this run's plugins into lock entries.
///
/// `fetched_at` is carried over from `existing` when the plugin's identity
/// is unchanged and set to `now` otherwise. Plugins not in `plugins` are
/// dropped. The result is sorted by name.
pub fn reconcile(
    plugins: &[ResolvedPlugin],
    existing: &HashMap<String, LockEntry>,
    now: DateTime<Utc>,
) -> Result<Vec<LockEntry>> {
    let mut entries = Vec::with_capacity(plugins.len());

    for plugin in plugins {
        let content_hash = match plugin.commit_sha {
            Some(_) => String::new(),
            None => compute_content_hash(&plugin.source_dir, &plugin.files)?,
        };

        let mut entry = LockEntry {
            name: plugin.name().to_string(),
            source: plugin.source().to_string(),
            content_hash,
            fetched_at: now,
            commit_sha: plugin.commit_sha.clone(),
        };

        match existing.get(&entry.source) {
            Some(previous) if previous.same_identity(&entry) => {
                entry.fetched_at = previous.fetched_at;
            }
            Some(_) => debug!(source = %entry.source, "plugin changed"),
            None => debug!(source = %entry.source, "new plugin"),
        }

        entries.push(entry);
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
