pub mod app;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod fs_util;
pub mod lock;
pub mod manifest;
pub mod platform;
pub mod plugin;
pub mod project;

pub use app::{
    BuildArtifacts, BuildReport, CleanResult, InitResult, IssueLevel, LockPrompts, PlatformBuild,
    SyncResult, ValidationIssue, ValidationReport,
};
pub use builder::{default_builders, ArtifactBuilder, ClaudeBuilder, CursorBuilder};
pub use cache::PluginCache;
pub use config::{PlatformConfig, ProjectConfig, Registry, RegistryType};
pub use error::{ErrorKind, PromptkitError, Result};
pub use lock::{compute_content_hash, reconcile, LockEntry, LockFile};
pub use manifest::ManifestTracker;
pub use platform::Platform;
pub use plugin::{
    GitRegistryClone, LocalPluginFetcher, MarketplaceFetcher, PluginFetcher, PluginSpec,
    RegistryMirror, ResolvedPlugin,
};
pub use project::Project;
