//! ModelScaleAndPose: unit scale and zero pose in model.sdf
//!
//! Checks the model's own `<pose>` and every `<mesh><scale>`.

use super::RuleSettings;
use crate::diagnostic::{Finding, Fix};
use crate::model::{ModelDescriptor, SdfField};
use crate::parse::approx_eq;

const RULE: &str = "ModelScaleAndPose";

pub(super) fn check(model: &ModelDescriptor, settings: &RuleSettings) -> Vec<Finding> {
    let sdf_path = model.sdf_path();
    let mut findings = Vec::new();

    // Absent means the simulator default, which is what we want
    for (field, value) in SdfField::ALL
        .into_iter()
        .flat_map(|field| model.sdf_values(field).iter().map(move |v| (field, v)))
    {
        let matches_default = value
            .values
            .as_deref()
            .is_some_and(|v| approx_eq(v, field.default_values(), settings.tolerance));
        if matches_default {
            continue;
        }

        let mut finding = Finding::new(
            RULE,
            &model.root_path,
            &format!(
                "<{}> is '{}' in model.sdf; expected '{}'",
                field.element(),
                value.raw.trim(),
                field.default_text()
            ),
        )
        .with_file(&sdf_path)
        .with_line(value.line);

        if let Some(span) = &value.span {
            finding = finding.with_fix(Fix::replace_span(
                &format!("Reset <{}> to '{}'", field.element(), field.default_text()),
                sdf_path.clone(),
                span.clone(),
                &value.raw,
                field.default_text(),
            ));
        }

        findings.push(finding);
    }

    findings
}
