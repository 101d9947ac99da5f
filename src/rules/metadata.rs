//! ConfigMetadata: author and description are filled in

use crate::diagnostic::Finding;
use crate::model::{ConfigField, EntryKind, ModelDescriptor};

const RULE: &str = "ConfigMetadata";

pub(super) fn check(model: &ModelDescriptor) -> Vec<Finding> {
    // A missing model.config is reported by FolderStructure
    if !model.has_entry(EntryKind::ModelConfig) {
        return Vec::new();
    }

    let config_path = model.config_path();
    ConfigField::ALL
        .into_iter()
        .filter_map(|field| {
            let problem = match model.config_fields.get(&field) {
                None => "missing",
                Some(value) if value.trim().is_empty() => "empty",
                Some(_) => return None,
            };
            Some(
                Finding::new(
                    RULE,
                    &model.root_path,
                    &format!("model.config field '{}' is {}", field.key(), problem),
                )
                .with_file(&config_path),
            )
        })
        .collect()
}
