//! Built-in rule set
//!
//! Every rule is a pure function of a [`ModelDescriptor`] and the read-only
//! [`RuleSettings`]. Rules run in the order of [`RuleId::ALL`]; adding a rule
//! means adding a variant, its check module, and its slot in that order.

mod material;
mod meshes;
mod metadata;
pub mod naming;
mod pose;
mod structure;
mod texture;

use crate::config::Config;
use crate::diagnostic::Finding;
use crate::model::ModelDescriptor;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a built-in rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    NamingConvention,
    FolderStructure,
    ConfigMetadata,
    MeshesContent,
    TextureNaming,
    MtlDiffuse,
    ModelScaleAndPose,
}

impl RuleId {
    /// All rules in evaluation (and reporting) order
    pub const ALL: [RuleId; 7] = [
        RuleId::NamingConvention,
        RuleId::FolderStructure,
        RuleId::ConfigMetadata,
        RuleId::MeshesContent,
        RuleId::TextureNaming,
        RuleId::MtlDiffuse,
        RuleId::ModelScaleAndPose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::NamingConvention => "NamingConvention",
            RuleId::FolderStructure => "FolderStructure",
            RuleId::ConfigMetadata => "ConfigMetadata",
            RuleId::MeshesContent => "MeshesContent",
            RuleId::TextureNaming => "TextureNaming",
            RuleId::MtlDiffuse => "MtlDiffuse",
            RuleId::ModelScaleAndPose => "ModelScaleAndPose",
        }
    }

    /// Run this rule against one model
    pub fn check(self, model: &ModelDescriptor, settings: &RuleSettings) -> Vec<Finding> {
        match self {
            RuleId::NamingConvention => naming::check(model),
            RuleId::FolderStructure => structure::check(model),
            RuleId::ConfigMetadata => metadata::check(model),
            RuleId::MeshesContent => meshes::check(model, settings),
            RuleId::TextureNaming => texture::check(model, settings),
            RuleId::MtlDiffuse => material::check(model, settings),
            RuleId::ModelScaleAndPose => pose::check(model, settings),
        }
    }

    /// Descriptive metadata
    pub fn rule(self) -> Rule {
        match self {
            RuleId::NamingConvention => Rule::new(self, "Model package names must be CamelCase")
                .with_rationale(
                    "Model URIs are built from the folder name; one naming style keeps world files predictable",
                )
                .with_example_bad("my_robot/")
                .with_example_good("MyRobot/")
                .fixable(),
            RuleId::FolderStructure => Rule::new(
                self,
                "A model folder holds exactly model.sdf, model.config and meshes/",
            )
            .with_rationale("Extra files are not shipped with the model and missing ones break loading")
            .with_example_bad("MyRobot/{model.sdf, model.config, meshes/, notes.txt}")
            .with_example_good("MyRobot/{model.sdf, model.config, meshes/}"),
            RuleId::ConfigMetadata => Rule::new(
                self,
                "model.config must declare author name, author email and description",
            )
            .with_rationale("Model databases index packages by their metadata")
            .with_example_bad("<author><name></name></author>")
            .with_example_good("<author><name>Jane Doe</name><email>jane@example.com</email></author>"),
            RuleId::MeshesContent => Rule::new(
                self,
                "The meshes folder only holds mesh, material and texture files",
            )
            .with_rationale("Renderers only load the supported formats; anything else is dead weight")
            .with_example_bad("meshes/robot.blend")
            .with_example_good("meshes/robot.dae"),
            RuleId::TextureNaming => Rule::new(
                self,
                "Textures are named <Name>_<Channel>.png with a PBR channel suffix",
            )
            .with_rationale("The channel suffix tells material tooling which map a texture is")
            .with_example_bad("meshes/robot_diffuse_final.png")
            .with_example_good("meshes/Robot_Diffuse.png")
            .fixable(),
            RuleId::MtlDiffuse => Rule::new(self, "Material diffuse (Kd) values are 0.8 0.8 0.8")
                .with_rationale(
                    "Diffuse colour comes from textures; a tinted Kd makes models render inconsistently",
                )
                .with_example_bad("Kd 0.5 0.5 0.5")
                .with_example_good("Kd 0.800000 0.800000 0.800000")
                .fixable(),
            RuleId::ModelScaleAndPose => Rule::new(
                self,
                "model.sdf uses unit scale and a zero pose",
            )
            .with_rationale("Placement and scaling belong in the world file, not in the asset")
            .with_example_bad("<scale>0.01 0.01 0.01</scale>")
            .with_example_good("<scale>1 1 1</scale>")
            .fixable(),
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown rule: {}", s))
    }
}

/// Read-only parameters shared by all checks
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSettings {
    /// PBR channel vocabulary for texture names
    pub channels: Vec<String>,
    /// Texture prefix must be the (CamelCase) package name
    pub require_model_prefix: bool,
    /// Extensions allowed in the meshes folder
    pub allowed_extensions: Vec<String>,
    /// Absolute tolerance for numeric comparisons
    pub tolerance: f64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Config::default().rule_settings()
    }
}

/// Run every rule for which `enabled` returns true, in declared order
pub fn check_model(
    model: &ModelDescriptor,
    settings: &RuleSettings,
    enabled: impl Fn(RuleId) -> bool,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for id in RuleId::ALL {
        if !enabled(id) {
            continue;
        }
        let help = id.rule().description;
        findings.extend(
            id.check(model, settings)
                .into_iter()
                .map(|f| f.with_help(&help)),
        );
    }
    findings
}
