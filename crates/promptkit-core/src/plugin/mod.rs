//! Plugin Module
//!
//! Resolving plugin specs into files on disk.
//!
//! - `registry`: git mirrors of marketplace registries
//! - `marketplace`: `.claude-plugin/marketplace.json` parsing
//! - `fetcher`: the `PluginFetcher` seam and the marketplace implementation
//! - `local`: plugins living in the project's `prompts/` directory

pub mod fetcher;
pub mod local;
pub mod marketplace;
pub mod registry;
pub mod types;

// Re-exports
pub use fetcher::{MarketplaceFetcher, PluginFetcher};
pub use local::LocalPluginFetcher;
pub use marketplace::{parse_marketplace, MARKETPLACE_FILE};
pub use registry::{git_available, GitRegistryClone, RegistryMirror};
pub use types::{
    Marketplace, MarketplaceMetadata, PluginEntry, PluginSource, PluginSpec, ResolvedPlugin,
    LOCAL_SOURCE_PREFIX,
};
