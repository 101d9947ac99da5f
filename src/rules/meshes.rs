//! MeshesContent: only allowed file types inside meshes/

use super::RuleSettings;
use crate::diagnostic::Finding;
use crate::model::ModelDescriptor;

const RULE: &str = "MeshesContent";

pub(super) fn check(model: &ModelDescriptor, settings: &RuleSettings) -> Vec<Finding> {
    let meshes_dir = model.meshes_dir();
    let mut findings = Vec::new();

    for mesh in &model.mesh_files {
        let message = if mesh.is_dir {
            format!("Subfolder '{}' is not allowed in meshes/", mesh.name)
        } else if mesh.extension.is_empty() {
            format!(
                "File '{}' has no extension; allowed: {}",
                mesh.name,
                settings.allowed_extensions.join(", ")
            )
        } else if !settings.allowed_extensions.contains(&mesh.extension) {
            format!(
                "Illegal extension '.{}' of '{}'; allowed: {}",
                mesh.extension,
                mesh.name,
                settings.allowed_extensions.join(", ")
            )
        } else {
            continue;
        };

        findings.push(
            Finding::new(RULE, &model.root_path, &message).with_file(&meshes_dir.join(&mesh.name)),
        );
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MeshFile;
    use crate::rules::testing::canonical_model;

    #[test]
    fn test_allowed_files_pass() {
        let mut model = canonical_model("MyRobot");
        model.mesh_files.push(MeshFile::new("MyRobot.obj", false));
        model.mesh_files.push(MeshFile::new("MyRobot.mtl", false));
        assert!(check(&model, &RuleSettings::default()).is_empty());
    }

    #[test]
    fn test_illegal_extension() {
        let mut model = canonical_model("MyRobot");
        model.mesh_files.push(MeshFile::new("extra.txt", false));

        let findings = check(&model, &RuleSettings::default());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Illegal extension '.txt' of 'extra.txt'"));
        assert_eq!(
            findings[0].file.as_deref(),
            Some(model.meshes_dir().join("extra.txt").as_path())
        );
    }

    #[test]
    fn test_extension_is_case_sensitive() {
        let mut model = canonical_model("MyRobot");
        model.mesh_files.push(MeshFile::new("Scan.DAE", false));
        assert_eq!(check(&model, &RuleSettings::default()).len(), 1);
    }

    #[test]
    fn test_subfolder_and_bare_file() {
        let mut model = canonical_model("MyRobot");
        model.mesh_files.push(MeshFile::new("textures", true));
        model.mesh_files.push(MeshFile::new("README", false));

        let findings = check(&model, &RuleSettings::default());
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.starts_with("Subfolder 'textures'"));
        assert!(findings[1].message.contains("has no extension"));
    }

    #[test]
    fn test_custom_allowed_extensions() {
        let mut model = canonical_model("MyRobot");
        model.mesh_files.push(MeshFile::new("MyRobot.stl", false));
        let settings = RuleSettings {
            allowed_extensions: vec!["dae".into(), "png".into(), "stl".into()],
            ..RuleSettings::default()
        };
        assert!(check(&model, &settings).is_empty());
    }
}
