use serde::{Deserialize, Serialize};
use skald_core::ProjectInfo;
use skald_store::SkaldPaths;

/// Optional project metadata (`.skald/project.json`): the human-maintained
/// inputs for the snapshot's fixed sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub stack: Vec<String>,
    pub constraints: Vec<String>,
}

impl ProjectMeta {
    /// Load `.skald/project.json`, or defaults when absent.
    pub fn load(paths: &SkaldPaths) -> anyhow::Result<Self> {
        if !paths.project_json.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&paths.project_json)?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid {}: {e}", paths.project_json.display()))
    }

    /// Resolve the snapshot project section, falling back to the repo
    /// directory name and the derived project id.
    pub fn project_info(&self, paths: &SkaldPaths) -> ProjectInfo {
        let fallback = paths
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        ProjectInfo {
            name: self.name.clone().unwrap_or(fallback),
            id: skald_store::project_id(&paths.root),
            description: self.description.clone(),
        }
    }
}
