//! TextureNaming: `<Name>_<Channel>.png`

use super::naming::{canonical_name, to_camel_case};
use super::RuleSettings;
use crate::diagnostic::{Finding, Fix};
use crate::model::{MeshFile, ModelDescriptor};
use log::debug;
use regex::Regex;

const RULE: &str = "TextureNaming";

pub(super) fn check(model: &ModelDescriptor, settings: &RuleSettings) -> Vec<Finding> {
    let meshes_dir = model.meshes_dir();
    let model_prefix = canonical_name(&model.declared_name);
    let matcher = ChannelMatcher::new(&settings.channels);

    let mut findings = Vec::new();
    for texture in model
        .mesh_files
        .iter()
        .filter(|m| !m.is_dir && m.extension == "png")
    {
        let Some(message) = violation(texture, settings, &model_prefix) else {
            continue;
        };

        let path = meshes_dir.join(&texture.name);
        let mut finding = Finding::new(RULE, &model.root_path, &message).with_file(&path);

        let fixed = matcher.as_ref().and_then(|m| {
            m.suggest(texture.stem(), &model_prefix, settings.require_model_prefix)
        });
        if let Some(new_name) = fixed.filter(|n| n != &texture.name) {
            finding = finding.with_fix(Fix::rename(
                &format!("Rename texture '{}' to '{}'", texture.name, new_name),
                path.clone(),
                meshes_dir.join(&new_name),
            ));
        }

        findings.push(finding);
    }

    findings
}

/// Describe what is wrong with a texture name, if anything
fn violation(texture: &MeshFile, settings: &RuleSettings, model_prefix: &str) -> Option<String> {
    let expected = format!("<Name>_<{}>.png", settings.channels.join("|"));

    let Some((prefix, channel)) = texture.stem().rsplit_once('_') else {
        return Some(format!(
            "Texture '{}' has no channel suffix; expected {}",
            texture.name, expected
        ));
    };
    if prefix.is_empty() {
        return Some(format!(
            "Texture '{}' has an empty name before the channel; expected {}",
            texture.name, expected
        ));
    }
    if !settings.channels.iter().any(|c| c == channel) {
        return Some(format!(
            "Texture '{}' has unknown channel '{}'; expected {}",
            texture.name, channel, expected
        ));
    }
    if settings.require_model_prefix && prefix != model_prefix {
        return Some(format!(
            "Texture '{}' should be prefixed with the model name '{}'",
            texture.name, model_prefix
        ));
    }
    None
}

/// Case-insensitive search for channel keywords inside a file stem
struct ChannelMatcher {
    regex: Regex,
    channels: Vec<String>,
}

impl ChannelMatcher {
    fn new(channels: &[String]) -> Option<Self> {
        if channels.is_empty() {
            return None;
        }
        // Longest first so that "Roughness" wins over "Rough"
        let mut ordered: Vec<&String> = channels.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = ordered
            .iter()
            .map(|c| regex::escape(c))
            .collect::<Vec<_>>()
            .join("|");

        match Regex::new(&format!("(?i)({})", alternation)) {
            Ok(regex) => Some(Self {
                regex,
                channels: channels.to_vec(),
            }),
            Err(e) => {
                debug!("Cannot build channel matcher: {}", e);
                None
            }
        }
    }

    /// Proposed file name, when exactly one distinct channel appears in `stem`
    fn suggest(&self, stem: &str, model_prefix: &str, require_model_prefix: bool) -> Option<String> {
        let mut found: Vec<&str> = Vec::new();
        for m in self.regex.find_iter(stem) {
            let channel = self
                .channels
                .iter()
                .find(|c| c.eq_ignore_ascii_case(m.as_str()))?;
            if !found.contains(&channel.as_str()) {
                found.push(channel);
            }
        }
        let [channel] = found.as_slice() else {
            return None;
        };

        let prefix = if require_model_prefix {
            model_prefix.to_string()
        } else {
            let rest = self.regex.replace_all(stem, "_");
            let camel = to_camel_case(&rest);
            if camel.is_empty() {
                model_prefix.to_string()
            } else {
                camel
            }
        };
        if prefix.is_empty() {
            return None;
        }

        Some(format!("{}_{}.png", prefix, channel))
    }
}
