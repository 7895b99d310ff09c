//! Cursor builder (`.cursor/`, skills under `skills-cursor/`)

use std::path::{Path, PathBuf};

use crate::builder::{build_platform, ArtifactBuilder};
use crate::error::Result;
use crate::platform::Platform;
use crate::plugin::ResolvedPlugin;

/// Cursor (.cursor/). Skills are written to `skills-cursor/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CursorBuilder;

impl ArtifactBuilder for CursorBuilder {
    fn platform(&self) -> Platform {
        Platform::Cursor
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::plugin::PluginSpec;

    #[test]
    fn test_cursor_layout() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("cache");
        for f in ["skills/pdf/SKILL.md", "rules/r.md", "README.md", "docs/guide.md"] {
            let path = src.join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, f).unwrap();
        }
        let plugin = ResolvedPlugin {
            spec: PluginSpec::new("official/docs"),
            files: vec![
                "README.md".to_string(),
                "docs/guide.md".to_string(),
                "rules/r.md".to_string(),
                "skills/pdf/SKILL.md".to_string(),
            ],
            source_dir: src,
            commit_sha: Some("sha".to_string()),
        };

        let out = temp.path().join(".cursor");
        let written = CursorBuilder.build(&[plugin], &out, temp.path()).unwrap();

        assert_eq!(
            written,
            vec![out.join("rules/r.md"), out.join("skills-cursor/pdf/SKILL.md")]
        );
        assert!(!out.join("skills").exists());
        assert!(!out.join("README.md").exists());
        assert!(!out.join("docs").exists());
    }
}
