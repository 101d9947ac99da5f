//! Configuration system for the asset linter
//!
//! Reads configuration from:
//! - `.assetlintrc.yaml` / `.assetlintrc.json` (project-level)
//! - `~/.assetlintrc.yaml` (user-level)
//! - an explicit `--config` path

use crate::rules::RuleSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Check models in parallel (fix runs are always sequential)
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,

    /// Color mode
    pub color: ColorMode,

    /// Verbose output
    pub verbose: bool,

    /// Show the summary line
    pub statistics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            verbose: false,
            statistics: true,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// How model packages are recognised under a root folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Any directory directly containing `model.config`, at any depth
    #[default]
    ConfigFile,
    /// Every immediate child directory of the root
    Children,
}

impl std::str::FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "config-file" | "config" => Ok(DetectionMode::ConfigFile),
            "children" => Ok(DetectionMode::Children),
            _ => Err(format!("Unknown detection mode: {}", s)),
        }
    }
}

/// File handling settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Glob patterns (relative to the root) of directories to skip
    pub exclude: Vec<String>,
}

/// Rule selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,
}

/// Texture naming settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TexturesConfig {
    /// PBR channel names accepted after the final underscore
    pub channels: Vec<String>,

    /// Require the texture prefix to equal the package name
    pub require_model_prefix: bool,
}

impl Default for TexturesConfig {
    fn default() -> Self {
        Self {
            channels: ["Diffuse", "Normal", "Roughness", "Metalness", "Rough", "Metal"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            require_model_prefix: false,
        }
    }
}

/// Meshes folder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshesConfig {
    /// Extensions (without the dot) allowed in the meshes folder
    pub allowed_extensions: Vec<String>,
}

impl Default for MeshesConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: ["dae", "obj", "mtl", "png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-3
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// File handling settings
    pub files: FilesConfig,

    /// Package detection mode
    pub detection: DetectionMode,

    /// Rule configuration
    pub rules: RulesConfig,

    /// Texture naming settings
    pub textures: TexturesConfig,

    /// Meshes folder settings
    pub meshes: MeshesConfig,

    /// Absolute tolerance for numeric comparisons
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output: OutputConfig::default(),
            files: FilesConfig::default(),
            detection: DetectionMode::default(),
            rules: RulesConfig::default(),
            textures: TexturesConfig::default(),
            meshes: MeshesConfig::default(),
            tolerance: default_tolerance(),
        }
    }
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the rule set cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.textures.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "texture channel names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [
            ".assetlintrc.yaml",
            ".assetlintrc.yml",
            ".assetlintrc.json",
            "asset-lint.yaml",
            "asset-lint.yml",
            "asset-lint.json",
        ];

        // Check current directory
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        verbose: Option<bool>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        enabled_rules: Option<Vec<String>>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(v) = verbose {
            self.output.verbose = v;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(enabled) = enabled_rules {
            self.rules.enabled = enabled;
        }
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.rules.disabled.iter().any(|r| r.eq_ignore_ascii_case(rule_id)) {
            return false;
        }

        // If enabled list is not empty, rule must be in it
        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|r| r.eq_ignore_ascii_case(rule_id));
        }

        true
    }

    /// Rule parameters derived from this configuration
    pub fn rule_settings(&self) -> RuleSettings {
        RuleSettings {
            channels: self.textures.channels.clone(),
            require_model_prefix: self.textures.require_model_prefix,
            allowed_extensions: self.meshes.allowed_extensions.clone(),
            tolerance: self.tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(config.engine.parallel);
        assert_eq!(config.engine.jobs, 0);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.detection, DetectionMode::ConfigFile);
        assert_eq!(config.tolerance, 1e-3);
        assert!(config.textures.channels.contains(&"Diffuse".to_string()));
        assert_eq!(config.meshes.allowed_extensions.len(), 4);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_detection_mode_from_str() {
        assert_eq!(
            "children".parse::<DetectionMode>().unwrap(),
            DetectionMode::Children
        );
        assert_eq!(
            "config-file".parse::<DetectionMode>().unwrap(),
            DetectionMode::ConfigFile
        );
        assert!("glob".parse::<DetectionMode>().is_err());
    }

    #[test]
    fn test_config_merge_cli() {
        let mut config = Config::new();
        config.merge_cli(
            Some(OutputFormat::Json),
            Some(true),
            Some(4),
            Some(vec!["MtlDiffuse".to_string()]),
            None,
        );

        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.verbose);
        assert_eq!(config.engine.jobs, 4);
        assert!(!config.is_rule_enabled("MtlDiffuse"));
    }

    #[test]
    fn test_rule_enabled() {
        let mut config = Config::new();

        // All rules enabled by default
        assert!(config.is_rule_enabled("NamingConvention"));

        config.rules.disabled.push("texturenaming".to_string());
        assert!(!config.is_rule_enabled("TextureNaming"));
        assert!(config.is_rule_enabled("MtlDiffuse"));

        config.rules.enabled = vec!["MtlDiffuse".to_string()];
        assert!(config.is_rule_enabled("MtlDiffuse"));
        assert!(!config.is_rule_enabled("NamingConvention"));
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = r#"
engine:
  parallel: false
detection: children
rules:
  disabled:
    - FolderStructure
textures:
  channels: [Albedo, Normal]
  require_model_prefix: true
tolerance: 0.01
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.engine.parallel);
        assert_eq!(config.detection, DetectionMode::Children);
        assert!(!config.is_rule_enabled("FolderStructure"));
        assert_eq!(config.textures.channels, vec!["Albedo", "Normal"]);
        assert!(config.textures.require_model_prefix);
        assert_eq!(config.tolerance, 0.01);
        // Untouched sections keep their defaults
        assert_eq!(config.meshes.allowed_extensions.len(), 4);
    }

    #[test]
    fn test_load_json_and_validate() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("asset-lint.json");
        std::fs::write(&good, r#"{"tolerance": 0.005, "output": {"format": "json"}}"#).unwrap();
        let config = Config::load(&good).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);

        let bad = temp.path().join("bad.yaml");
        std::fs::write(&bad, "tolerance: -1").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Invalid(_))));

        let unknown = temp.path().join("config.toml");
        std::fs::write(&unknown, "").unwrap();
        assert!(matches!(Config::load(&unknown), Err(ConfigError::Invalid(_))));
    }
}
