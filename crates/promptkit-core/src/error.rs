use std::path::PathBuf;
use thiserror::Error;

/// Broad failure class, used for exit codes and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Registry, git, or marketplace resolution failures
    Sync,
    /// Lock file, cache, or output directory failures during build
    Build,
    /// Malformed config or lock documents
    Validation,
    /// Plain I/O or serialization failures
    Io,
}

#[derive(Debug, Error)]
pub enum PromptkitError {
    // ========== Sync ==========
    #[error("git is required but not found on PATH. Install git to use registry plugins.")]
    GitNotFound,

    #[error("Git command failed: git {command}\n{stderr}")]
    GitCommand { command: String, stderr: String },

    #[error("No fetcher registered for registry: {registry}")]
    NoFetcher { registry: String },

    #[error("marketplace.json not found at {path}. Registry '{registry}' may not be a valid marketplace.")]
    MarketplaceNotFound { registry: String, path: PathBuf },

    #[error("Invalid marketplace.json at {path}: {message}")]
    MarketplaceParse { path: PathBuf, message: String },

    #[error("Plugin '{plugin}' not found in marketplace.json for registry '{registry}'")]
    PluginNotFound { plugin: String, registry: String },

    #[error("External source not supported for plugin '{plugin}'. Only relative-path plugins are supported in this version.")]
    ExternalSourceUnsupported { plugin: String },

    #[error("Plugin directory not found in registry clone: {path}")]
    PluginDirNotFound { path: String },

    #[error("Plugin path escapes the registry clone: {path}")]
    PathTraversal { path: PathBuf },

    #[error("Local plugin not found: {path}")]
    LocalPluginNotFound { path: String },

    #[error("Failed to fetch plugin '{plugin}': {source}")]
    Fetch {
        plugin: String,
        #[source]
        source: std::io::Error,
    },

    // ========== Build ==========
    #[error("Lock file not found. Run 'promptkit lock' first.")]
    LockFileNotFound,

    #[error("Cached plugin missing for '{name}' (sha: {sha}). Run 'promptkit lock' to re-fetch.")]
    CacheMissing { name: String, sha: String },

    #[error("Local plugin not found for '{name}': {path}")]
    LocalPluginMissing { name: String, path: String },

    #[error("Failed to copy '{path}' of plugin '{plugin}': {source}")]
    Copy {
        plugin: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ========== Validation ==========
    #[error("{message}")]
    Validation { message: String },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    // ========== Plumbing ==========
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Project already initialized: {path} exists")]
    AlreadyInitialized { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, PromptkitError>;

impl PromptkitError {
    /// Shorthand for a validation failure with a free-form message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GitNotFound
            | Self::GitCommand { .. }
            | Self::NoFetcher { .. }
            | Self::MarketplaceNotFound { .. }
            | Self::MarketplaceParse { .. }
            | Self::PluginNotFound { .. }
            | Self::ExternalSourceUnsupported { .. }
            | Self::PluginDirNotFound { .. }
            | Self::PathTraversal { .. }
            | Self::LocalPluginNotFound { .. }
            | Self::Fetch { .. } => ErrorKind::Sync,
            Self::LockFileNotFound
            | Self::CacheMissing { .. }
            | Self::LocalPluginMissing { .. }
            | Self::Copy { .. } => ErrorKind::Build,
            Self::Validation { .. }
            | Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::AlreadyInitialized { .. } => ErrorKind::Validation,
            Self::Io(_) | Self::TomlSer(_) => ErrorKind::Io,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Sync => 2,
            ErrorKind::Build => 3,
            ErrorKind::Validation => 4,
            ErrorKind::Io => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_variants() {
        assert_eq!(PromptkitError::GitNotFound.kind(), ErrorKind::Sync);
        assert_eq!(PromptkitError::LockFileNotFound.kind(), ErrorKind::Build);
        assert_eq!(
            PromptkitError::validation("bad").kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_cache_missing_message_names_plugin_and_sha() {
        let err = PromptkitError::CacheMissing {
            name: "code-review".to_string(),
            sha: "sha123".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code-review"));
        assert!(msg.contains("sha123"));
        assert_eq!(err.exit_code(), 3);
    }
}
