//! Leaf element extraction for `model.config` and `model.sdf`

use super::ParseError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::ops::Range;

/// Text of an element that has no child elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementText {
    /// Element names from the document root down to this element
    pub path: Vec<String>,
    /// Text between the tags exactly as written (may be empty)
    pub raw: String,
    /// Byte span of `raw`; `None` for self-closing elements
    pub span: Option<Range<usize>>,
    /// 1-based line of the opening tag
    pub line: usize,
}

impl ElementText {
    /// Element name
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// Check whether the full path from the document root is `path`
    pub fn is_at(&self, path: &[&str]) -> bool {
        self.path.len() == path.len() && self.ends_with(path)
    }

    /// Check whether the path ends with `suffix`
    pub fn ends_with(&self, suffix: &[&str]) -> bool {
        self.path.len() >= suffix.len()
            && self.path[self.path.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(a, b)| a == b)
    }

    /// Trimmed, unescaped text
    pub fn text(&self) -> String {
        let trimmed = self.raw.trim();
        match quick_xml::escape::unescape(trimmed) {
            Ok(text) => text.into_owned(),
            Err(_) => trimmed.to_string(),
        }
    }
}

struct OpenElement {
    name: String,
    content_start: usize,
    text: Option<Range<usize>>,
    line: usize,
    has_children: bool,
}

/// Collect the text of every leaf element, in document order
pub fn leaf_elements(content: &str) -> Result<Vec<ElementText>, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut leaves = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut buf = Vec::new();

    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |pos: usize| line_starts.partition_point(|&start| start <= pos);

    let path_with = |stack: &[OpenElement], name: &str| -> Vec<String> {
        stack
            .iter()
            .map(|open| open.name.clone())
            .chain(std::iter::once(name.to_string()))
            .collect()
    };

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(OpenElement {
                    name,
                    content_start: reader.buffer_position() as usize,
                    text: None,
                    line: line_of(before),
                    has_children: false,
                });
            }

            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                leaves.push(ElementText {
                    path: path_with(&stack, &name),
                    raw: String::new(),
                    span: None,
                    line: line_of(before),
                });
            }

            Ok(Event::Text(_)) | Ok(Event::CData(_)) => {
                let after = reader.buffer_position() as usize;
                if let Some(open) = stack.last_mut() {
                    open.text = Some(match open.text.take() {
                        Some(existing) => existing.start..after,
                        None => before..after,
                    });
                }
            }

            Ok(Event::End(_)) => {
                if let Some(open) = stack.pop() {
                    if !open.has_children {
                        let span = open
                            .text
                            .unwrap_or(open.content_start..open.content_start);
                        leaves.push(ElementText {
                            path: path_with(&stack, &open.name),
                            raw: content.get(span.clone()).unwrap_or("").to_string(),
                            span: Some(span),
                            line: open.line,
                        });
                    }
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(ParseError::Xml {
                    line: line_of(reader.buffer_position() as usize),
                    message: e.to_string(),
                });
            }

            _ => {}
        }
        buf.clear();
    }

    Ok(leaves)
}
