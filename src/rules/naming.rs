//! NamingConvention: package directories are CamelCase

use crate::diagnostic::{Finding, Fix};
use crate::model::ModelDescriptor;

const RULE: &str = "NamingConvention";

/// Check whether `name` is CamelCase
///
/// Uppercase ASCII first letter, ASCII alphanumerics only, and at least one
/// lowercase letter so that `ROBOT` is rejected.
pub fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    name.chars().all(|c| c.is_ascii_alphanumeric()) && name.chars().any(|c| c.is_ascii_lowercase())
}

/// Suggest a CamelCase rewrite of `name`
///
/// `my_robot` and `MY-ROBOT` both become `MyRobot`; `myRobot` keeps its inner
/// capitals.
pub fn to_camel_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let (head, rest) = token.split_at(1);
            let rest = if rest.chars().any(|c| c.is_ascii_lowercase()) {
                rest.to_string()
            } else {
                rest.to_ascii_lowercase()
            };
            format!("{}{}", head.to_ascii_uppercase(), rest)
        })
        .collect()
}

/// Name the package should have: its own name when valid, else the suggestion
/// when that is valid, else the name unchanged
pub fn canonical_name(name: &str) -> String {
    if is_camel_case(name) {
        return name.to_string();
    }
    let suggestion = to_camel_case(name);
    if is_camel_case(&suggestion) {
        suggestion
    } else {
        name.to_string()
    }
}

pub(super) fn check(model: &ModelDescriptor) -> Vec<Finding> {
    let name = &model.declared_name;
    if is_camel_case(name) {
        return Vec::new();
    }

    let suggestion = to_camel_case(name);
    let mut finding = Finding::new(
        RULE,
        &model.root_path,
        &format!(
            "Model name '{}' is not CamelCase; expected something like '{}'",
            name, suggestion
        ),
    );

    if is_camel_case(&suggestion) && &suggestion != name {
        if let Some(parent) = model.root_path.parent() {
            finding = finding.with_fix(Fix::rename(
                &format!("Rename package '{}' to '{}'", name, suggestion),
                model.root_path.clone(),
                parent.join(&suggestion),
            ));
        }
    }

    vec![finding]
}
