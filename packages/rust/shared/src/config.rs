//! Application configuration for docflow.
//!
//! A project config lives at `./docflow.toml`; a user-wide fallback lives at
//! `~/.docflow/docflow.toml`. CLI flags override config file values, which
//! override defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocflowError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docflow.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docflow";

/// Metadata key holding the root directory files are read from.
pub const INPUT_PATH_KEY: &str = "InputPath";

// ---------------------------------------------------------------------------
// Config structs (matching docflow.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine-wide metadata visible to every document through its parent scope.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Pipelines in execution order.
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

/// `[[pipelines]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unique pipeline name.
    pub name: String,

    /// File search pattern for the leading `ReadFiles` step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,

    /// Search sub-directories as well as the top directory.
    #[serde(default)]
    pub recursive: bool,

    /// Metadata applied to every document after reading.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,

    /// Ordered If / ElseIf branches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchConfig>,

    /// Else branch, applied to documents no branch claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<ActionConfig>,
}

/// `[[pipelines.branches]]` entry: a metadata test plus the actions it guards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Metadata key to test.
    pub key: String,

    /// Match when the key's value equals this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,

    /// Match when the key is present (`true`) or absent (`false`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    /// What to do with matched documents.
    #[serde(flatten)]
    pub action: ActionConfig,
}

/// Actions a branch applies to the documents it claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Metadata overrides.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,

    /// Text inserted before the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepend: Option<String>,

    /// Text added after the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<String>,
}

impl ActionConfig {
    /// Whether this action changes anything at all.
    pub fn is_noop(&self) -> bool {
        self.set.is_empty() && self.prepend.is_none() && self.append.is_none()
    }
}

impl AppConfig {
    /// A starter config: read markdown files and tag them by extension.
    pub fn sample() -> Self {
        let mut metadata = Map::new();
        metadata.insert(INPUT_PATH_KEY.into(), Value::String("input".into()));

        let mut page = Map::new();
        page.insert("Layout".into(), Value::String("page".into()));
        let mut raw = Map::new();
        raw.insert("Layout".into(), Value::String("raw".into()));

        Self {
            metadata,
            pipelines: vec![PipelineConfig {
                name: "content".into(),
                read: Some("*.*".into()),
                recursive: true,
                set: Map::new(),
                branches: vec![BranchConfig {
                    key: "FileExt".into(),
                    equals: Some(Value::String(".md".into())),
                    exists: None,
                    action: ActionConfig {
                        set: page,
                        prepend: None,
                        append: None,
                    },
                }],
                otherwise: Some(ActionConfig {
                    set: raw,
                    prepend: None,
                    append: None,
                }),
            }],
        }
    }

    /// Check structural rules serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for pipeline in &self.pipelines {
            if pipeline.name.trim().is_empty() {
                return Err(DocflowError::config("pipeline name must not be empty"));
            }
            if !seen.insert(pipeline.name.as_str()) {
                return Err(DocflowError::config(format!(
                    "duplicate pipeline name '{}'",
                    pipeline.name
                )));
            }
            if matches!(pipeline.read.as_deref(), Some(p) if p.trim().is_empty()) {
                return Err(DocflowError::config(format!(
                    "pipeline '{}': read pattern must not be empty",
                    pipeline.name
                )));
            }
            for (i, branch) in pipeline.branches.iter().enumerate() {
                if branch.equals.is_none() && branch.exists.is_none() {
                    return Err(DocflowError::config(format!(
                        "pipeline '{}': branch {} on key '{}' needs `equals` or `exists`",
                        pipeline.name,
                        i + 1,
                        branch.key
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.docflow/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocflowError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.docflow/docflow.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Find the config file to use: an explicit path, `./docflow.toml`, or the
/// user config file. Returns `None` when nothing exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(DocflowError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    let user = config_file_path()?;
    if user.exists() {
        return Ok(Some(user));
    }

    Ok(None)
}

/// Load the application config. Returns defaults if no file is found.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match resolve_config_path(explicit)? {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocflowError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| DocflowError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;

    tracing::debug!(?path, pipelines = config.pipelines.len(), "config loaded");
    Ok(config)
}

/// Write the sample config into `dir` (or the user config directory).
/// Returns the path to the created file.
pub fn init_config(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => config_dir()?,
    };
    std::fs::create_dir_all(&dir).map_err(|e| DocflowError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(DocflowError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::sample())
        .map_err(|e| DocflowError::Serialization(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocflowError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docflow-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn sample_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::sample()).expect("serialize sample");
        assert!(toml_str.contains("InputPath"));
        assert!(toml_str.contains("FileExt"));
    }

    #[test]
    fn sample_config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::sample()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        parsed.validate().expect("sample is valid");
        assert_eq!(parsed.pipelines.len(), 1);
        assert_eq!(parsed.pipelines[0].branches.len(), 1);
        assert!(parsed.pipelines[0].otherwise.is_some());
    }

    #[test]
    fn config_with_branches() {
        let toml_str = r#"
[metadata]
InputPath = "site"
Title = "Docs"

[[pipelines]]
name = "pages"
read = "*.md"
recursive = true

[[pipelines.branches]]
key = "FileBase"
equals = "index"
set = { Layout = "home" }
append = "\n"

[[pipelines.branches]]
key = "Draft"
exists = true
prepend = "DRAFT: "

[pipelines.otherwise]
set = { Layout = "page" }
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.metadata["InputPath"], Value::String("site".into()));

        let pipeline = &config.pipelines[0];
        assert_eq!(pipeline.read.as_deref(), Some("*.md"));
        assert!(pipeline.recursive);
        assert_eq!(pipeline.branches.len(), 2);
        assert_eq!(pipeline.branches[0].action.append.as_deref(), Some("\n"));
        assert_eq!(pipeline.branches[1].exists, Some(true));
        assert_eq!(
            pipeline.otherwise.as_ref().unwrap().set["Layout"],
            Value::String("page".into())
        );
    }

    #[test]
    fn branch_without_test_is_rejected() {
        let toml_str = r#"
[[pipelines]]
name = "pages"

[[pipelines.branches]]
key = "FileExt"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("needs `equals` or `exists`"));
    }

    #[test]
    fn duplicate_pipeline_names_are_rejected() {
        let toml_str = r#"
[[pipelines]]
name = "pages"

[[pipelines]]
name = "pages"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn empty_read_pattern_is_rejected() {
        let mut config = AppConfig::sample();
        config.pipelines[0].read = Some("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_path_errors() {
        let result = load_config(Some(Path::new("/definitely/not/here/docflow.toml")));
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn init_writes_loadable_file() {
        let dir = temp_dir();
        let path = init_config(Some(&dir)).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.pipelines[0].name, "content");

        // A second init must not clobber the file.
        assert!(init_config(Some(&dir)).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
