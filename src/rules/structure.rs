//! FolderStructure: exactly model.sdf, model.config and meshes/

use crate::diagnostic::Finding;
use crate::model::{EntryKind, ModelDescriptor, MESHES_DIR, MODEL_CONFIG, MODEL_SDF};

const RULE: &str = "FolderStructure";

pub(super) fn check(model: &ModelDescriptor) -> Vec<Finding> {
    let mut findings = Vec::new();

    let required = [
        (EntryKind::ModelSdf, MODEL_SDF, "file"),
        (EntryKind::ModelConfig, MODEL_CONFIG, "file"),
        (EntryKind::MeshesFolder, MESHES_DIR, "folder"),
    ];
    for (kind, name, what) in required {
        if !model.has_entry(kind) {
            findings.push(Finding::new(
                RULE,
                &model.root_path,
                &format!("Missing required {} '{}'", what, name),
            ));
        }
    }

    for entry in model.extra_entries() {
        let what = if entry.is_dir { "folder" } else { "file" };
        findings.push(
            Finding::new(
                RULE,
                &model.root_path,
                &format!(
                    "Unexpected {} '{}'; a model only contains {}, {} and {}/",
                    what, entry.name, MODEL_SDF, MODEL_CONFIG, MESHES_DIR
                ),
            )
            .with_file(&model.root_path.join(&entry.name)),
        );
    }

    findings
}
