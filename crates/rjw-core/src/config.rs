use crate::context::scan::Language;
use crate::error::{Result, RjwError};
use crate::paths;
use crate::types::TrustLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// GovernanceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub trust_level: TrustLevel,
    #[serde(default)]
    pub yolo_mode: bool,
}

// ---------------------------------------------------------------------------
// GuardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_strict")]
    pub strict_mode: bool,
}

fn default_strict() -> bool {
    true
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            strict_mode: default_strict(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContextConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Dependency hops followed when collecting related code.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

fn default_max_depth() -> usize {
    2
}

fn default_extensions() -> Vec<String> {
    vec!["rs".to_string(), "py".to_string()]
}

fn default_skip_dirs() -> Vec<String> {
    [
        "target",
        ".git",
        "venv",
        "env",
        "__pycache__",
        "build",
        "dist",
        "node_modules",
        ".rjw",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            extensions: default_extensions(),
            skip_dirs: default_skip_dirs(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            governance: GovernanceConfig::default(),
            guard: GuardConfig::default(),
            context: ContextConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RjwError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !self.guard.strict_mode {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "guard.strict_mode is off: code writes skip traceability checks".to_string(),
            });
        }

        if self.governance.yolo_mode {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "governance.yolo_mode is on: approvals bypass the trust ladder".to_string(),
            });
        }

        if self.context.max_depth == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "context.max_depth is 0: related code will not follow dependencies".to_string(),
            });
        } else if self.context.max_depth > 5 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "context.max_depth={} (>5 pulls in most of the project)",
                    self.context.max_depth
                ),
            });
        }

        if self.context.extensions.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "context.extensions is empty: scans will find nothing".to_string(),
            });
        }
        for ext in &self.context.extensions {
            if Language::from_extension(ext).is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("context.extensions has unsupported extension '{ext}'"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
