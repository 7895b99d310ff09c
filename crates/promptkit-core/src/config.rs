//! Project configuration
//!
//! `promptkit.toml` declares registries, prompts and per-platform output
//! directories. The raw TOML shape accepts short and table forms and is
//! validated into the types below.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PromptkitError, Result};
use crate::platform::Platform;
use crate::plugin::PluginSpec;

pub const CONFIG_FILENAME: &str = "promptkit.toml";

/// Template written by `promptkit init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# promptkit configuration
version = 1

# Plugins to install. Either "<registry>/<plugin>" or a table:
#   { source = "official/pdf", name = "pdf", platforms = ["cursor"] }
# Files under prompts/ are picked up automatically.
prompts = []

[registries]
# Short form: name = "<git url>"
# official = "https://github.com/anthropics/claude-plugins-official"
# Table form:
# team = { url = "https://github.com/acme/prompts", type = "claude-marketplace" }

# Output directories per platform. Defaults to both platforms when empty.
# [platforms]
# cursor = ".cursor"
# claude-code = { output_dir = ".claude" }
"#;

/// Kind of registry a source points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryType {
    ClaudeMarketplace,
}

impl RegistryType {
    pub fn id(&self) -> &'static str {
        match self {
            Self::ClaudeMarketplace => "claude-marketplace",
        }
    }

    pub fn all() -> &'static [RegistryType] {
        &[RegistryType::ClaudeMarketplace]
    }
}

impl std::str::FromStr for RegistryType {
    type Err = PromptkitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.id() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::all().iter().map(|t| t.id()).collect();
                PromptkitError::validation(format!(
                    "Unknown registry type: '{}'. Valid types: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub name: String,
    pub url: String,
    pub registry_type: RegistryType,
}

/// Where one platform's artifacts go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub name: String,
    pub platform: Platform,
    pub output_dir: String,
}

impl PlatformConfig {
    pub fn default_for(platform: Platform) -> Self {
        Self {
            name: platform.id().to_string(),
            platform,
            output_dir: platform.default_output_dir().to_string(),
        }
    }
}

/// Parsed and validated promptkit.toml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub version: u32,
    pub registries: Vec<Registry>,
    pub prompts: Vec<PluginSpec>,
    pub platforms: Vec<PlatformConfig>,
}

// ========== On-disk shape ==========

#[derive(Debug, Deserialize)]
struct RawConfig {
    version: Option<u32>,
    #[serde(default)]
    registries: BTreeMap<String, RawRegistry>,
    prompts: Option<Vec<RawPrompt>>,
    #[serde(default)]
    platforms: BTreeMap<String, RawPlatform>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRegistry {
    Url(String),
    Table {
        url: String,
        #[serde(default, rename = "type")]
        registry_type: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrompt {
    Source(String),
    Table {
        source: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        platforms: Vec<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlatform {
    OutputDir(String),
    Table {
        #[serde(default, rename = "type")]
        platform_type: Option<String>,
        #[serde(default)]
        output_dir: Option<String>,
    },
}

impl ProjectConfig {
    /// Load and validate the config at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PromptkitError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&content).map_err(|e| PromptkitError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_raw(raw)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| PromptkitError::validation(format!("Invalid config: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Write the commented template to `path`
    pub fn init(path: &Path) -> Result<PathBuf> {
        if path.exists() {
            return Err(PromptkitError::AlreadyInitialized {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(path.to_path_buf())
    }

    /// Output directory configured for `platform`, if it is built at all
    pub fn output_dir(&self, platform: Platform) -> Option<&str> {
        self.platforms
            .iter()
            .find(|p| p.platform == platform)
            .map(|p| p.output_dir.as_str())
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let version = raw
            .version
            .ok_or_else(|| PromptkitError::validation("Missing required field: 'version'"))?;
        let prompts = raw
            .prompts
            .ok_or_else(|| PromptkitError::validation("Missing required field: 'prompts'"))?;

        let registries = raw
            .registries
            .into_iter()
            .map(|(name, entry)| parse_registry(name, entry))
            .collect::<Result<Vec<_>>>()?;

        let prompts = prompts
            .into_iter()
            .map(parse_prompt)
            .collect::<Result<Vec<_>>>()?;

        let platforms = if raw.platforms.is_empty() {
            Platform::all()
                .iter()
                .map(|p| PlatformConfig::default_for(*p))
                .collect()
        } else {
            let platforms = raw
                .platforms
                .into_iter()
                .map(|(name, entry)| parse_platform(name, entry))
                .collect::<Result<Vec<_>>>()?;
            reject_duplicate_platforms(&platforms)?;
            platforms
        };

        Ok(Self {
            version,
            registries,
            prompts,
            platforms,
        })
    }
}

fn parse_registry(name: String, entry: RawRegistry) -> Result<Registry> {
    let (url, registry_type) = match entry {
        RawRegistry::Url(url) => (url, RegistryType::ClaudeMarketplace),
        RawRegistry::Table { url, registry_type } => {
            let registry_type = match registry_type {
                Some(t) => t.parse()?,
                None => RegistryType::ClaudeMarketplace,
            };
            (url, registry_type)
        }
    };

    Ok(Registry {
        name,
        url,
        registry_type,
    })
}

fn parse_prompt(entry: RawPrompt) -> Result<PluginSpec> {
    match entry {
        RawPrompt::Source(source) => Ok(PluginSpec::new(source)),
        RawPrompt::Table {
            source,
            name,
            platforms,
        } => {
            let platforms = platforms
                .iter()
                .map(|p| p.parse::<Platform>())
                .collect::<Result<Vec<_>>>()?;
            Ok(PluginSpec::new(source)
                .with_name(name.unwrap_or_default())
                .with_platforms(platforms))
        }
    }
}

/// The key names the platform unless a table gives an explicit `type`
fn parse_platform(name: String, entry: RawPlatform) -> Result<PlatformConfig> {
    let (type_name, output_dir) = match entry {
        RawPlatform::OutputDir(dir) => (name.clone(), Some(dir)),
        RawPlatform::Table {
            platform_type,
            output_dir,
        } => (platform_type.unwrap_or_else(|| name.clone()), output_dir),
    };

    let platform: Platform = type_name.parse()?;
    Ok(PlatformConfig {
        name,
        platform,
        output_dir: output_dir.unwrap_or_else(|| platform.default_output_dir().to_string()),
    })
}

/// Build manifests are kept per platform, so each platform may have only
/// one output directory
fn reject_duplicate_platforms(platforms: &[PlatformConfig]) -> Result<()> {
    for (i, config) in platforms.iter().enumerate() {
        if let Some(first) = platforms[..i].iter().find(|p| p.platform == config.platform) {
            return Err(PromptkitError::validation(format!(
                "Platforms '{}' and '{}' both target {}; each platform can have only one output directory",
                first.name, config.name, config.platform
            )));
        }
    }
    Ok(())
}
