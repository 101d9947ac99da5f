//! In-memory description of one model package

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// File name of the SDF description
pub const MODEL_SDF: &str = "model.sdf";
/// File name of the package metadata
pub const MODEL_CONFIG: &str = "model.config";
/// Name of the meshes folder
pub const MESHES_DIR: &str = "meshes";

/// Classification of an immediate child of a package directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    ModelSdf,
    ModelConfig,
    MeshesFolder,
    Other,
}

/// Immediate child of a package directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub is_dir: bool,
}

impl Entry {
    /// Classify a child by name and type
    pub fn classify(name: &str, is_dir: bool) -> Self {
        let kind = match (name, is_dir) {
            (MODEL_SDF, false) => EntryKind::ModelSdf,
            (MODEL_CONFIG, false) => EntryKind::ModelConfig,
            (MESHES_DIR, true) => EntryKind::MeshesFolder,
            _ => EntryKind::Other,
        };
        Self {
            name: name.to_string(),
            kind,
            is_dir,
        }
    }
}

/// Entry of the meshes folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshFile {
    pub name: String,
    /// Extension without the dot; empty when there is none
    pub extension: String,
    pub is_dir: bool,
}

impl MeshFile {
    pub fn new(name: &str, is_dir: bool) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        Self {
            name: name.to_string(),
            extension,
            is_dir,
        }
    }

    /// File name without the extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Metadata fields read from `model.config`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConfigField {
    AuthorName,
    AuthorEmail,
    Description,
}

impl ConfigField {
    pub const ALL: [ConfigField; 3] = [
        ConfigField::AuthorName,
        ConfigField::AuthorEmail,
        ConfigField::Description,
    ];

    /// Dotted key used in messages
    pub fn key(&self) -> &'static str {
        match self {
            ConfigField::AuthorName => "author.name",
            ConfigField::AuthorEmail => "author.email",
            ConfigField::Description => "description",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Transform fields read from `model.sdf`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SdfField {
    Scale,
    Pose,
}

impl SdfField {
    pub const ALL: [SdfField; 2] = [SdfField::Scale, SdfField::Pose];

    /// XML element name
    pub fn element(&self) -> &'static str {
        match self {
            SdfField::Scale => "scale",
            SdfField::Pose => "pose",
        }
    }

    /// Canonical value every model is expected to use
    pub fn default_values(&self) -> &'static [f64] {
        match self {
            SdfField::Scale => &[1.0, 1.0, 1.0],
            SdfField::Pose => &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        }
    }

    /// Canonical value as element text
    pub fn default_text(&self) -> &'static str {
        match self {
            SdfField::Scale => "1 1 1",
            SdfField::Pose => "0 0 0 0 0 0",
        }
    }
}

/// A `<scale>` or `<pose>` value found in `model.sdf`
///
/// Only the model's own `<pose>` (a direct child of `<model>`) and the
/// `<scale>` of every `<mesh>` are read; link, joint and visual poses are
/// relative placements and are left alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdfValue {
    /// Element text exactly as written
    pub raw: String,
    /// Parsed numbers; `None` when the text is not a list of numbers
    pub values: Option<Vec<f64>>,
    /// Byte span of the element text in `model.sdf`; `None` for `<pose/>` or
    /// when the file is not valid UTF-8
    pub span: Option<Range<usize>>,
    /// 1-based line of the element
    pub line: usize,
}

/// A `Kd` directive found in a `.mtl` file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffuseValue {
    /// Source `.mtl` file
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Byte span of the line, without its line terminator; `None` when the
    /// file is not valid UTF-8 and the line cannot be rewritten in place
    pub span: Option<Range<usize>>,
    /// Line text as written
    pub raw: String,
    /// Parsed RGB triple; `None` when the directive could not be parsed
    pub rgb: Option<[f64; 3]>,
}

/// Discovered state of one model package
///
/// Built by the scanner and never mutated; a fix pass rescans instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    /// Absolute location of the package
    pub root_path: PathBuf,
    /// Package directory name
    pub declared_name: String,
    /// Immediate children, sorted by name
    pub entries: Vec<Entry>,
    /// Contents of the meshes folder, sorted by name
    pub mesh_files: Vec<MeshFile>,
    /// Metadata from `model.config`; a missing key means the field is absent
    pub config_fields: BTreeMap<ConfigField, String>,
    /// Transform values from `model.sdf` in document order; a missing key
    /// means the field is absent
    pub sdf_fields: BTreeMap<SdfField, Vec<SdfValue>>,
    /// Diffuse directives from every `.mtl` file, in file then line order
    pub mtl_diffuse: Vec<DiffuseValue>,
}

impl ModelDescriptor {
    /// Empty descriptor for a package at `root_path`
    pub fn new(root_path: PathBuf) -> Self {
        let declared_name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            root_path,
            declared_name,
            entries: Vec::new(),
            mesh_files: Vec::new(),
            config_fields: BTreeMap::new(),
            sdf_fields: BTreeMap::new(),
            mtl_diffuse: Vec::new(),
        }
    }

    /// Check whether a canonical entry is present
    pub fn has_entry(&self, kind: EntryKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Entries beyond the canonical three
    pub fn extra_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Other)
    }

    /// Values recorded for `field`, empty when it is absent
    pub fn sdf_values(&self, field: SdfField) -> &[SdfValue] {
        self.sdf_fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn meshes_dir(&self) -> PathBuf {
        self.root_path.join(MESHES_DIR)
    }

    pub fn sdf_path(&self) -> PathBuf {
        self.root_path.join(MODEL_SDF)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root_path.join(MODEL_CONFIG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_classification() {
        assert_eq!(Entry::classify("model.sdf", false).kind, EntryKind::ModelSdf);
        assert_eq!(
            Entry::classify("model.config", false).kind,
            EntryKind::ModelConfig
        );
        assert_eq!(Entry::classify("meshes", true).kind, EntryKind::MeshesFolder);
        // A file called "meshes" is not the meshes folder
        assert_eq!(Entry::classify("meshes", false).kind, EntryKind::Other);
        assert_eq!(Entry::classify("model.sdf", true).kind, EntryKind::Other);
        assert_eq!(Entry::classify("README.md", false).kind, EntryKind::Other);
    }

    #[test]
    fn test_mesh_file_extension() {
        let mesh = MeshFile::new("Robot_Diffuse.png", false);
        assert_eq!(mesh.extension, "png");
        assert_eq!(mesh.stem(), "Robot_Diffuse");

        let bare = MeshFile::new("LICENSE", false);
        assert_eq!(bare.extension, "");
        assert_eq!(bare.stem(), "LICENSE");
    }

    #[test]
    fn test_descriptor_name_from_path() {
        let model = ModelDescriptor::new(PathBuf::from("/models/my_robot"));
        assert_eq!(model.declared_name, "my_robot");
        assert_eq!(model.meshes_dir(), PathBuf::from("/models/my_robot/meshes"));
        assert!(!model.has_entry(EntryKind::ModelSdf));
        assert!(model.sdf_values(SdfField::Pose).is_empty());
    }

    #[test]
    fn test_sdf_field_defaults() {
        assert_eq!(SdfField::Scale.default_values().len(), 3);
        assert_eq!(SdfField::Pose.default_values().len(), 6);
        assert_eq!(SdfField::Pose.default_text(), "0 0 0 0 0 0");
    }
}
