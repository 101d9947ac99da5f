//! Readers for the text artifacts inside a model package
//!
//! `model.config` and `model.sdf` are XML; `.mtl` files are Wavefront material
//! text. Readers report byte spans so fixes can rewrite values in place.

pub mod mtl;
pub mod xml;

use thiserror::Error;

/// Error while reading a package artifact
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error at line {line}: {message}")]
    Xml { line: usize, message: String },
}

/// Parse a whitespace separated list of numbers
///
/// Returns `None` for empty text or any token that is not a number.
pub fn parse_numbers(text: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = text
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Compare two vectors element-wise within `tolerance`
pub fn approx_eq(actual: &[f64], expected: &[f64], tolerance: f64) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (a - e).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("1 2.5 -3"), Some(vec![1.0, 2.5, -3.0]));
        assert_eq!(parse_numbers("  0\n0\t0 "), Some(vec![0.0, 0.0, 0.0]));
        assert_eq!(parse_numbers(""), None);
        assert_eq!(parse_numbers("1 two 3"), None);
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(&[0.8, 0.8, 0.8], &[0.8, 0.8, 0.8], 1e-3));
        assert!(approx_eq(&[0.8004, 0.8, 0.7996], &[0.8, 0.8, 0.8], 1e-3));
        assert!(!approx_eq(&[0.79, 0.8, 0.8], &[0.8, 0.8, 0.8], 1e-3));
        assert!(!approx_eq(&[1.0, 1.0], &[1.0, 1.0, 1.0], 1e-3));
    }
}
