//! Claude Code builder (`.claude/`)

use std::path::{Path, PathBuf};

use crate::builder::{build_platform, ArtifactBuilder};
use crate::error::Result;
use crate::platform::Platform;
use crate::plugin::ResolvedPlugin;

/// Claude Code (.claude/)
#[derive(Debug, Default, Clone, Copy)]
pub struct ClaudeBuilder;

impl ArtifactBuilder for ClaudeBuilder {
    fn platform(&self) -> Platform {
        Platform::ClaudeCode
    }

    fn build(
        &self,
        plugins: &[ResolvedPlugin],
        output_dir: &Path,
        project_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        build_platform(self.platform(), plugins, output_dir, project_dir)
    }
}
