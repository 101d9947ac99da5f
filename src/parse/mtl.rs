//! Diffuse (`Kd`) directive extraction for Wavefront `.mtl` files

use std::ops::Range;

/// A `Kd` line of a material file
#[derive(Debug, Clone, PartialEq)]
pub struct KdLine {
    /// 1-based line number
    pub line: usize,
    /// Byte span of the line, without the line terminator
    pub span: Range<usize>,
    /// Line text
    pub raw: String,
    /// RGB triple; `None` when the directive is not plain numbers
    pub rgb: Option<[f64; 3]>,
}

/// Find every `Kd` directive in `content`
///
/// `map_Kd` texture directives are not diffuse values and are skipped.
/// A single component (`Kd r`) stands for `r r r`.
pub fn diffuse_lines(content: &str) -> Vec<KdLine> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for (idx, chunk) in content.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += chunk.len();

        let text = chunk.trim_end_matches(['\n', '\r']);
        let directive = text.split('#').next().unwrap_or("");
        let mut tokens = directive.split_whitespace();
        if tokens.next() != Some("Kd") {
            continue;
        }

        let numbers: Option<Vec<f64>> = tokens.map(|t| t.parse::<f64>().ok()).collect();
        let rgb = match numbers.as_deref() {
            Some([r]) => Some([*r, *r, *r]),
            Some([r, g, b]) => Some([*r, *g, *b]),
            _ => None,
        };

        lines.push(KdLine {
            line: idx + 1,
            span: start..start + text.len(),
            raw: text.to_string(),
            rgb,
        });
    }

    lines
}

/// Rewrite a `Kd` line to the given colour, keeping its indentation
pub fn rewrite_kd(raw: &str, rgb: [f64; 3]) -> String {
    let indent_len = raw.len() - raw.trim_start().len();
    format!(
        "{}Kd {:.6} {:.6} {:.6}",
        &raw[..indent_len],
        rgb[0],
        rgb[1],
        rgb[2]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diffuse_lines() {
        let mtl = "newmtl Body\nKa 1.0 1.0 1.0\nKd 0.8 0.8 0.8\nmap_Kd Body_Diffuse.png\n\nnewmtl Trim\n  Kd 0.5 0.5 0.5\n";
        let lines = diffuse_lines(mtl);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 3);
        assert_eq!(lines[0].rgb, Some([0.8, 0.8, 0.8]));
        assert_eq!(&mtl[lines[0].span.clone()], "Kd 0.8 0.8 0.8");
        assert_eq!(lines[1].line, 7);
        assert_eq!(lines[1].rgb, Some([0.5, 0.5, 0.5]));
        assert_eq!(lines[1].raw, "  Kd 0.5 0.5 0.5");
    }

    #[test]
    fn test_crlf_and_comments() {
        let mtl = "Kd 0.1 0.2 0.3 # tinted\r\nKd 0.9\r\n";
        let lines = diffuse_lines(mtl);

        assert_eq!(lines[0].rgb, Some([0.1, 0.2, 0.3]));
        assert_eq!(&mtl[lines[0].span.clone()], "Kd 0.1 0.2 0.3 # tinted");
        assert_eq!(lines[1].rgb, Some([0.9, 0.9, 0.9]));
    }

    #[test]
    fn test_unparseable_kd() {
        let lines = diffuse_lines("Kd spectral ident.rfl\nKd 0.8 0.8\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].rgb.is_none());
        assert!(lines[1].rgb.is_none());
    }

    #[test]
    fn test_rewrite_kd() {
        assert_eq!(
            rewrite_kd("\tKd 0.5 0.5 0.5", [0.8, 0.8, 0.8]),
            "\tKd 0.800000 0.800000 0.800000"
        );
    }
}
