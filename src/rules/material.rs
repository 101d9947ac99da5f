//! MtlDiffuse: every `Kd` is 0.8 0.8 0.8

use super::RuleSettings;
use crate::diagnostic::{Finding, Fix};
use crate::model::ModelDescriptor;
use crate::parse::{approx_eq, mtl};

const RULE: &str = "MtlDiffuse";

/// Diffuse colour every material is expected to use
pub const EXPECTED_DIFFUSE: [f64; 3] = [0.8, 0.8, 0.8];

pub(super) fn check(model: &ModelDescriptor, settings: &RuleSettings) -> Vec<Finding> {
    let mut findings = Vec::new();

    for kd in &model.mtl_diffuse {
        let file_name = kd
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let message = match kd.rgb {
            Some(rgb) if approx_eq(&rgb, &EXPECTED_DIFFUSE, settings.tolerance) => continue,
            Some(rgb) => format!(
                "Diffuse value ({}, {}, {}) in {} line {}; expected (0.8, 0.8, 0.8)",
                rgb[0], rgb[1], rgb[2], file_name, kd.line
            ),
            None => format!(
                "Unparseable diffuse value '{}' in {} line {}",
                kd.raw.trim(),
                file_name,
                kd.line
            ),
        };

        let mut finding = Finding::new(RULE, &model.root_path, &message)
            .with_file(&kd.file)
            .with_line(kd.line);

        if let Some(span) = &kd.span {
            finding = finding.with_fix(Fix::replace_span(
                &format!("Reset Kd in {} line {}", file_name, kd.line),
                kd.file.clone(),
                span.clone(),
                &kd.raw,
                &mtl::rewrite_kd(&kd.raw, EXPECTED_DIFFUSE),
            ));
        }

        findings.push(finding);
    }

    findings
}
