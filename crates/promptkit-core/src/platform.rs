//! Platform abstraction for multi-platform builds
//!
//! Supports building plugin artifacts for different AI coding assistants:
//! - Cursor (.cursor/)
//! - Claude Code (.claude/)

use serde::{Deserialize, Serialize};

use crate::error::PromptkitError;

/// Categories that name plugin roots during local discovery
/// (`scripts/` only ever ships alongside another category).
pub const DISCOVERY_CATEGORY_DIRS: &[&str] =
    &["rules", "skills", "agents", "commands", "subagents", "hooks"];

/// Cursor routing: skills live in a dedicated directory
const CURSOR_CATEGORY_MAP: &[(&str, &str)] = &[
    ("rules", "rules"),
    ("skills", "skills-cursor"),
    ("agents", "agents"),
    ("commands", "commands"),
    ("subagents", "subagents"),
    ("hooks", "hooks"),
    ("scripts", "scripts"),
];

/// Claude Code routing: categories pass through unchanged
const CLAUDE_CATEGORY_MAP: &[(&str, &str)] = &[
    ("rules", "rules"),
    ("skills", "skills"),
    ("agents", "agents"),
    ("commands", "commands"),
    ("subagents", "subagents"),
    ("hooks", "hooks"),
    ("scripts", "scripts"),
];

/// Target platform for artifact generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Cursor (.cursor/)
    Cursor,
    /// Claude Code (.claude/)
    ClaudeCode,
}

impl Platform {
    /// Get platform name for display
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cursor => "Cursor",
            Self::ClaudeCode => "Claude Code",
        }
    }

    /// Identifier used in promptkit.toml
    pub fn id(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::ClaudeCode => "claude-code",
        }
    }

    /// Name of this platform's build manifest (without extension)
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::ClaudeCode => "claude",
        }
    }

    /// Output directory used when the config does not name one
    pub fn default_output_dir(&self) -> &'static str {
        match self {
            Self::Cursor => ".cursor",
            Self::ClaudeCode => ".claude",
        }
    }

    /// Get all supported platforms
    pub fn all() -> &'static [Platform] {
        &[Platform::Cursor, Platform::ClaudeCode]
    }

    /// Reverse of [`Platform::manifest_name`]
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.manifest_name() == name)
    }

    fn category_map(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Cursor => CURSOR_CATEGORY_MAP,
            Self::ClaudeCode => CLAUDE_CATEGORY_MAP,
        }
    }

    /// Output directory for a category, or `None` if this platform drops it
    pub fn category_dir(&self, category: &str) -> Option<&'static str> {
        self.category_map()
            .iter()
            .find(|(from, _)| *from == category)
            .map(|(_, to)| *to)
    }

    /// Map a plugin-relative file path to its output path for this platform.
    ///
    /// Returns `None` for files outside a recognized category, including
    /// files with no directory segment at all.
    pub fn map_path(&self, relative: &str) -> Option<String> {
        let (category, rest) = relative.split_once('/')?;
        if rest.is_empty() {
            return None;
        }
        let target = self.category_dir(category)?;
        Some(format!("{}/{}", target, rest))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Platform {
    type Err = PromptkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cursor" => Ok(Self::Cursor),
            "claude-code" => Ok(Self::ClaudeCode),
            _ => {
                let valid: Vec<&str> = Self::all().iter().map(|p| p.id()).collect();
                Err(PromptkitError::validation(format!(
                    "Unknown platform target: '{}'. Valid targets: {}",
                    s,
                    valid.join(", ")
                )))
            }
        }
    }
}
