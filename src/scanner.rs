//! Model package discovery and descriptor construction

use crate::config::{Config, DetectionMode};
use crate::model::{
    ConfigField, DiffuseValue, Entry, EntryKind, MeshFile, ModelDescriptor, SdfField, SdfValue,
};
use crate::parse::{mtl, parse_numbers, xml};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Error that prevents a package (or the whole root) from being scanned
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid exclude pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("internal error while processing {}: {message}", path.display())]
    Internal { path: PathBuf, message: String },
}

impl ScanError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Discovers model packages and builds their descriptors
///
/// The scanner only reads; nothing here mutates the filesystem.
pub struct ModelScanner {
    detection: DetectionMode,
    exclude: GlobSet,
}

impl ModelScanner {
    /// Create a scanner from configuration
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.files.exclude {
            let glob = Glob::new(pattern).map_err(|e| ScanError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|e| ScanError::Pattern {
            pattern: config.files.exclude.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            detection: config.detection,
            exclude,
        })
    }

    /// Find package directories below `root`, sorted by path
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let meta = fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        // Fail early on an unreadable root instead of reporting zero models
        fs::read_dir(root).map_err(|e| ScanError::io(root, e))?;

        let packages = match self.detection {
            DetectionMode::ConfigFile => self.discover_by_config(root),
            DetectionMode::Children => self.discover_children(root)?,
        };
        debug!("Discovered {} model(s) under {}", packages.len(), root.display());
        Ok(packages)
    }

    fn discover_by_config(&self, root: &Path) -> Vec<PathBuf> {
        let mut packages = Vec::new();
        let mut walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable path during discovery: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if entry.depth() > 0 && (is_hidden(path) || self.is_excluded(root, path)) {
                walker.skip_current_dir();
                continue;
            }

            if path.join(crate::model::MODEL_CONFIG).is_file() {
                packages.push(path.to_path_buf());
                // Packages are leaves; their subfolders are package content
                walker.skip_current_dir();
            }
        }

        packages
    }

    fn discover_children(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut packages = Vec::new();
        for entry in fs::read_dir(root).map_err(|e| ScanError::io(root, e))? {
            let entry = entry.map_err(|e| ScanError::io(root, e))?;
            let path = entry.path();
            if path.is_dir() && !is_hidden(&path) && !self.is_excluded(root, &path) {
                packages.push(path);
            }
        }
        packages.sort();
        Ok(packages)
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.exclude.is_match(relative)
    }

    /// Build the descriptor for one package
    ///
    /// Only a failure to list the package directory is an error; unreadable or
    /// malformed files leave the corresponding fields absent.
    pub fn scan_model(&self, path: &Path) -> Result<ModelDescriptor, ScanError> {
        let root_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| ScanError::io(path, e))?
                .join(path)
        };
        let mut model = ModelDescriptor::new(root_path);

        model.entries = list_dir(&model.root_path)?
            .into_iter()
            .map(|(name, is_dir)| Entry::classify(&name, is_dir))
            .collect();

        if model.has_entry(EntryKind::ModelConfig) {
            read_config(&model.config_path(), &mut model);
        }
        if model.has_entry(EntryKind::ModelSdf) {
            read_sdf(&model.sdf_path(), &mut model);
        }
        if model.has_entry(EntryKind::MeshesFolder) {
            read_meshes(&model.meshes_dir(), &mut model);
        }

        Ok(model)
    }

    /// Discover and scan every package below `root`
    pub fn scan(
        &self,
        root: &Path,
    ) -> Result<Vec<(PathBuf, Result<ModelDescriptor, ScanError>)>, ScanError> {
        Ok(self
            .discover(root)?
            .into_iter()
            .map(|path| {
                let scanned = self.scan_model(&path);
                (path, scanned)
            })
            .collect())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// List a directory as (name, is_dir) pairs sorted by name
fn list_dir(dir: &Path) -> Result<Vec<(String, bool)>, ScanError> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ScanError::io(dir, e))? {
        let entry = entry.map_err(|e| ScanError::io(dir, e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| ScanError::io(&entry.path(), e))?
            .is_dir();
        items.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    items.sort();
    Ok(items)
}

/// Decoded file contents
struct FileText {
    content: String,
    /// The bytes were valid UTF-8, so offsets into `content` are file offsets
    exact: bool,
}

/// Read a file, replacing invalid UTF-8 instead of failing
fn read_text(path: &Path) -> Option<FileText> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Treating {} as absent: {}", path.display(), e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(content) => Some(FileText {
            content,
            exact: true,
        }),
        Err(e) => {
            debug!("{} is not valid UTF-8; fixes disabled for it", path.display());
            Some(FileText {
                content: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                exact: false,
            })
        }
    }
}

fn read_config(path: &Path, model: &mut ModelDescriptor) {
    let Some(file) = read_text(path) else {
        return;
    };
    let leaves = match xml::leaf_elements(&file.content) {
        Ok(leaves) => leaves,
        Err(e) => {
            debug!("{}: {}", path.display(), e);
            return;
        }
    };

    for field in ConfigField::ALL {
        let suffix: &[&str] = match field {
            ConfigField::AuthorName => &["model", "author", "name"],
            ConfigField::AuthorEmail => &["model", "author", "email"],
            ConfigField::Description => &["model", "description"],
        };
        if let Some(leaf) = leaves.iter().find(|l| l.ends_with(suffix)) {
            model.config_fields.insert(field, leaf.text());
        }
    }
}

fn read_sdf(path: &Path, model: &mut ModelDescriptor) {
    let Some(file) = read_text(path) else {
        return;
    };
    let leaves = match xml::leaf_elements(&file.content) {
        Ok(leaves) => leaves,
        Err(e) => {
            debug!("{}: {}", path.display(), e);
            return;
        }
    };

    let sdf_value = |leaf: &xml::ElementText| SdfValue {
        raw: leaf.raw.clone(),
        values: parse_numbers(&leaf.text()),
        span: leaf.span.clone().filter(|_| file.exact),
        line: leaf.line,
    };

    // The model's own pose; <model> may also be the document root
    let pose: Vec<SdfValue> = leaves
        .iter()
        .find(|l| l.is_at(&["sdf", "model", "pose"]) || l.is_at(&["model", "pose"]))
        .map(sdf_value)
        .into_iter()
        .collect();
    let scales: Vec<SdfValue> = leaves
        .iter()
        .filter(|l| l.ends_with(&["mesh", "scale"]))
        .map(sdf_value)
        .collect();

    for (field, values) in [(SdfField::Pose, pose), (SdfField::Scale, scales)] {
        if !values.is_empty() {
            model.sdf_fields.insert(field, values);
        }
    }
}

fn read_meshes(dir: &Path, model: &mut ModelDescriptor) {
    let items = match list_dir(dir) {
        Ok(items) => items,
        Err(e) => {
            warn!("{}", e);
            return;
        }
    };

    for (name, is_dir) in items {
        let mesh = MeshFile::new(&name, is_dir);
        if !mesh.is_dir && mesh.extension == "mtl" {
            let file = dir.join(&mesh.name);
            if let Some(text) = read_text(&file) {
                model
                    .mtl_diffuse
                    .extend(mtl::diffuse_lines(&text.content).into_iter().map(|kd| {
                        DiffuseValue {
                            file: file.clone(),
                            line: kd.line,
                            span: Some(kd.span).filter(|_| text.exact),
                            raw: kd.raw,
                            rgb: kd.rgb,
                        }
                    }));
            }
        }
        model.mesh_files.push(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scanner() -> ModelScanner {
        ModelScanner::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_discover_nested_packages() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("Table/model.config"), "<model/>");
        write(&root.join("vehicles/Car/model.config"), "<model/>");
        write(&root.join("vehicles/notes.txt"), "not a model");
        // A model.config inside a package does not start a new package
        write(&root.join("Table/meshes/Inner/model.config"), "<model/>");
        write(&root.join(".git/Hidden/model.config"), "<model/>");

        let found = scanner().discover(root).unwrap();
        assert_eq!(
            found,
            vec![root.join("Table"), root.join("vehicles/Car")]
        );
    }

    #[test]
    fn test_discover_children_mode() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("Bare")).unwrap();
        write(&root.join("Table/model.config"), "<model/>");
        write(&root.join("readme.md"), "");

        let mut config = Config::default();
        config.detection = DetectionMode::Children;
        let found = ModelScanner::new(&config).unwrap().discover(root).unwrap();
        assert_eq!(found, vec![root.join("Bare"), root.join("Table")]);
    }

    #[test]
    fn test_discover_excludes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("Table/model.config"), "<model/>");
        write(&root.join("wip/Chair/model.config"), "<model/>");

        let mut config = Config::default();
        config.files.exclude = vec!["wip".to_string()];
        let found = ModelScanner::new(&config).unwrap().discover(root).unwrap();
        assert_eq!(found, vec![root.join("Table")]);
    }

    #[test]
    fn test_discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = scanner().discover(&temp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::Io { .. })));
    }

    #[test]
    fn test_scan_model_fields() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("Crate");
        write(
            &pkg.join("model.config"),
            "<model><author><name>Ann</name><email>ann@example.com</email></author><description>Box</description></model>",
        );
        write(
            &pkg.join("model.sdf"),
            "<sdf><model name=\"Crate\"><pose>0 0 1 0 0 0</pose><link><visual><geometry><mesh><scale>2 2 2</scale></mesh></geometry></visual></link></model></sdf>",
        );
        write(&pkg.join("meshes/Crate.mtl"), "newmtl a\nKd 0.5 0.5 0.5\n");
        write(&pkg.join("meshes/Crate.obj"), "");

        let model = scanner().scan_model(&pkg).unwrap();

        assert_eq!(model.declared_name, "Crate");
        assert_eq!(model.entries.len(), 3);
        assert!(model.extra_entries().next().is_none());
        assert_eq!(
            model.config_fields.get(&ConfigField::AuthorName).map(String::as_str),
            Some("Ann")
        );
        assert_eq!(
            model.config_fields.get(&ConfigField::Description).map(String::as_str),
            Some("Box")
        );
        let pose = model.sdf_values(SdfField::Pose);
        assert_eq!(pose.len(), 1);
        assert_eq!(pose[0].values, Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0]));
        let scale = model.sdf_values(SdfField::Scale);
        assert_eq!(scale.len(), 1);
        assert_eq!(scale[0].raw, "2 2 2");
        assert_eq!(model.mesh_files.len(), 2);
        assert_eq!(model.mtl_diffuse.len(), 1);
        assert_eq!(model.mtl_diffuse[0].rgb, Some([0.5, 0.5, 0.5]));
        assert_eq!(model.mtl_diffuse[0].line, 2);
        assert_eq!(model.mtl_diffuse[0].span, Some(9..23));
    }

    #[test]
    fn test_link_pose_is_not_the_model_pose() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("Cart");
        write(&pkg.join("model.config"), "<model/>");
        write(
            &pkg.join("model.sdf"),
            "<model name=\"m\"><link name=\"wheel\"><pose>0 0.3 0.1 0 0 0</pose></link></model>",
        );

        let model = scanner().scan_model(&pkg).unwrap();
        assert!(!model.sdf_fields.contains_key(&SdfField::Pose));
        assert!(model.sdf_values(SdfField::Pose).is_empty());
    }

    #[test]
    fn test_model_pose_when_model_is_root() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("Cart");
        write(&pkg.join("model.config"), "<model/>");
        write(
            &pkg.join("model.sdf"),
            "<model name=\"m\"><link name=\"wheel\"><pose>0 0.3 0.1 0 0 0</pose></link><pose>1 0 0 0 0 0</pose></model>",
        );

        let model = scanner().scan_model(&pkg).unwrap();
        let pose = model.sdf_values(SdfField::Pose);
        assert_eq!(pose.len(), 1);
        assert_eq!(pose[0].raw, "1 0 0 0 0 0");
    }

    #[test]
    fn test_every_mesh_scale_is_read() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("Shelf");
        write(&pkg.join("model.config"), "<model/>");
        write(
            &pkg.join("model.sdf"),
            "<sdf><model name=\"shelf\"><link name=\"l\">\
             <visual name=\"a\"><geometry><mesh><scale>1 1 1</scale></mesh></geometry></visual>\
             <visual name=\"b\"><geometry><mesh><scale>0.01 0.01 0.01</scale></mesh></geometry></visual>\
             <collision name=\"c\"><geometry><box><size>1 1 1</size></box></geometry></collision>\
             </link></model></sdf>",
        );

        let model = scanner().scan_model(&pkg).unwrap();
        let raws: Vec<_> = model
            .sdf_values(SdfField::Scale)
            .iter()
            .map(|v| v.raw.as_str())
            .collect();
        assert_eq!(raws, vec!["1 1 1", "0.01 0.01 0.01"]);
    }

    #[test]
    fn test_mtl_with_invalid_utf8_is_still_scanned() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("Cafe");
        write(&pkg.join("model.config"), "<model/>");
        fs::create_dir_all(pkg.join("meshes")).unwrap();
        fs::write(
            pkg.join("meshes/Cafe.mtl"),
            b"# caf\xe9 material\nnewmtl A\nKd 0.1 0.1 0.1\n",
        )
        .unwrap();

        let model = scanner().scan_model(&pkg).unwrap();
        assert_eq!(model.mtl_diffuse.len(), 1);
        assert_eq!(model.mtl_diffuse[0].line, 3);
        assert_eq!(model.mtl_diffuse[0].rgb, Some([0.1, 0.1, 0.1]));
        // Offsets into the decoded text do not match the file
        assert_eq!(model.mtl_diffuse[0].span, None);
    }

    #[test]
    fn test_scan_model_tolerates_bad_files() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("Broken");
        write(&pkg.join("model.config"), "<model><author>");
        write(&pkg.join("model.sdf"), "<sdf><model><pose>a b c</pose></model></sdf>");

        let model = scanner().scan_model(&pkg).unwrap();
        assert!(model.config_fields.is_empty());
        assert_eq!(model.sdf_values(SdfField::Pose)[0].values, None);
        assert!(model.mesh_files.is_empty());
    }

    #[test]
    fn test_scan_model_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = scanner().scan_model(&temp.path().join("Gone"));
        assert!(matches!(result, Err(ScanError::Io { .. })));
    }
}
