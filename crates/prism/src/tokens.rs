//! HSL fallback generation for OKLCH token files.
//!
//! A token file declares canonical colors as custom properties:
//!
//! ```css
//! --primary: oklch(0.68 0.18 130); /* brand green */
//! ```
//!
//! and reserves a region between two marker comments for derived fallbacks:
//!
//! ```css
//! /* @generated hsl-fallbacks:start */
//! --primary-hsl: 82 87% 36%; /* brand green */
//! /* @generated hsl-fallbacks:end */
//! ```
//!
//! [`process_definitions`] rebuilds that region from the definitions in three
//! phases:
//!
//! 1. **Scan** every line outside the region for definitions.
//! 2. **Validate** each one. Invalid definitions become errors and are left
//!    out, but never stop the pass.
//! 3. **Splice** the regenerated lines between the markers, in source order.
//!
//! The splice is all-or-nothing. If the markers cannot be located, the input
//! is returned byte-for-byte with an error; nothing outside the region is
//! ever rewritten.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::color::{HslColor, OklchColor};
use crate::error::{MarkerError, OklchError, ProcessError};

/// Default opening marker of the generated region.
pub const GENERATED_START: &str = "/* @generated hsl-fallbacks:start */";

/// Default closing marker of the generated region.
pub const GENERATED_END: &str = "/* @generated hsl-fallbacks:end */";

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*--(?P<name>[A-Za-z0-9_-]+)\s*:\s*(?P<value>oklch\([^)]*\))\s*;\s*(?:/\*\s*(?P<comment>.*?)\s*\*/)?\s*$",
    )
    .expect("definition pattern is valid")
});

/// The literal comment pair bounding the generated region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Markers {
    pub start: String,
    pub end: String,
}

impl Markers {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(GENERATED_START, GENERATED_END)
    }
}

/// One OKLCH definition found while scanning, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    /// 1-based line number in the source text.
    pub line: usize,
    /// Property name without the leading `--`.
    pub name: String,
    /// The `oklch(...)` text exactly as written.
    pub literal: String,
    pub comment: Option<String>,
}

impl Definition {
    /// Parse and range-check the literal.
    ///
    /// # Errors
    ///
    /// Returns [`OklchError`] if the literal is malformed or out of range.
    pub fn color(&self) -> Result<OklchColor, OklchError> {
        OklchColor::parse(&self.literal)
    }
}

/// One generated fallback line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    /// Source property name without the leading `--`.
    pub name: String,
    pub hsl: HslColor,
    pub comment: String,
}

impl Fallback {
    fn from_definition(definition: &Definition, color: &OklchColor) -> Self {
        let comment = definition
            .comment
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("fallback for --{}", definition.name));
        Self {
            name: definition.name.clone(),
            hsl: color.to_hsl(),
            comment,
        }
    }

    /// Render as `--name-hsl: H S% L%; /* comment */` without indentation.
    pub fn render(&self) -> String {
        format!("--{}-hsl: {}; /* {} */", self.name, self.hsl, self.comment)
    }
}

/// Result of a generation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// The new text, or the input unchanged if the splice was refused.
    pub updated_text: String,
    /// Number of fallback lines written into the region.
    pub generated_count: usize,
    pub errors: Vec<ProcessError>,
}

impl ProcessOutput {
    /// Returns true if the region was rewritten.
    pub fn spliced(&self) -> bool {
        !self.errors.iter().any(ProcessError::is_structural)
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Byte layout of a located generated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region<'a> {
    /// Index of the start marker's line.
    start_line: usize,
    /// Index of the end marker's line.
    end_line: usize,
    /// Byte offset just past the start marker's line.
    body_start: usize,
    /// Byte offset of the end marker's line.
    body_end: usize,
    indent: &'a str,
    newline: &'a str,
}

fn locate_region<'a>(text: &'a str, markers: &Markers) -> Result<Region<'a>, MarkerError> {
    let mut offset = 0;
    let mut start: Option<(usize, usize, &str, &str)> = None;
    let mut end_seen_early = false;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_end = offset + line.len();
        match start {
            None if line.contains(&markers.start) => {
                let indent_len = line.len() - line.trim_start().len();
                let newline = if line.ends_with("\r\n") {
                    "\r\n"
                } else {
                    "\n"
                };
                start = Some((index, line_end, &line[..indent_len], newline));
            }
            None => {
                if line.contains(&markers.end) {
                    end_seen_early = true;
                }
            }
            Some((start_line, body_start, indent, newline)) if line.contains(&markers.end) => {
                return Ok(Region {
                    start_line,
                    end_line: index,
                    body_start,
                    body_end: offset,
                    indent,
                    newline,
                });
            }
            Some(_) => {}
        }
        offset = line_end;
    }

    match start {
        None => Err(MarkerError::MissingStart(markers.start.clone())),
        Some(_) if end_seen_early || text.contains(&markers.end) => Err(MarkerError::OutOfOrder {
            start: markers.start.clone(),
            end: markers.end.clone(),
        }),
        Some(_) => Err(MarkerError::MissingEnd(markers.end.clone())),
    }
}

fn scan(text: &str, skip: Option<(usize, usize)>) -> Vec<Definition> {
    text.split_inclusive('\n')
        .enumerate()
        .filter(|(index, _)| !skip.is_some_and(|(lo, hi)| (lo..=hi).contains(index)))
        .filter_map(|(index, line)| {
            let caps = DEFINITION_RE.captures(line.trim_end_matches(['\r', '\n']))?;
            Some(Definition {
                line: index + 1,
                name: caps["name"].to_string(),
                literal: caps["value"].to_string(),
                comment: caps.name("comment").map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}

/// Scan for OKLCH definitions using the default markers.
///
/// See [`extract_definitions_with`].
pub fn extract_definitions(text: &str) -> Vec<Definition> {
    extract_definitions_with(text, &Markers::default())
}

/// Scan for OKLCH definitions in source order.
///
/// Lines inside the generated region (markers included) are skipped when the
/// region can be located; otherwise every line is scanned.
pub fn extract_definitions_with(text: &str, markers: &Markers) -> Vec<Definition> {
    let skip = locate_region(text, markers)
        .ok()
        .map(|region| (region.start_line, region.end_line));
    scan(text, skip)
}

/// Validate definitions, splitting them into fallbacks and errors.
pub fn build_fallbacks(definitions: &[Definition]) -> (Vec<Fallback>, Vec<ProcessError>) {
    let mut fallbacks = Vec::with_capacity(definitions.len());
    let mut errors = Vec::new();
    for definition in definitions {
        match definition.color() {
            Ok(color) => {
                let fallback = Fallback::from_definition(definition, &color);
                debug!(
                    tokens.name = %definition.name,
                    tokens.line = definition.line,
                    tokens.hsl = %fallback.hsl,
                    "Definition converted"
                );
                fallbacks.push(fallback);
            }
            Err(error) => {
                debug!(
                    tokens.name = %definition.name,
                    tokens.line = definition.line,
                    error = %error,
                    "Definition rejected"
                );
                errors.push(ProcessError::Definition {
                    line: definition.line,
                    name: definition.name.clone(),
                    error,
                });
            }
        }
    }
    (fallbacks, errors)
}

/// Regenerate the fallback region using the default markers.
///
/// See [`process_definitions_with`].
pub fn process_definitions(text: &str) -> ProcessOutput {
    process_definitions_with(text, &Markers::default())
}

/// Regenerate the fallback region between `markers`.
///
/// Best-effort per definition, fail-closed per file: every valid definition
/// is converted, and the region is replaced only if both markers are found
/// in order. Running this on its own output is a no-op.
pub fn process_definitions_with(text: &str, markers: &Markers) -> ProcessOutput {
    let region = locate_region(text, markers);
    let skip = region
        .as_ref()
        .ok()
        .map(|region| (region.start_line, region.end_line));
    let definitions = scan(text, skip);
    let (fallbacks, mut errors) = build_fallbacks(&definitions);

    let region = match region {
        Ok(region) => region,
        Err(error) => {
            warn!(error = %error, "Generated region not found, leaving text unchanged");
            errors.push(error.into());
            return ProcessOutput {
                updated_text: text.to_string(),
                generated_count: 0,
                errors,
            };
        }
    };

    let body: String = fallbacks
        .iter()
        .map(|fallback| format!("{}{}{}", region.indent, fallback.render(), region.newline))
        .collect();

    let mut updated_text =
        String::with_capacity(region.body_start + body.len() + text.len() - region.body_end);
    updated_text.push_str(&text[..region.body_start]);
    updated_text.push_str(&body);
    updated_text.push_str(&text[region.body_end..]);

    info!(
        tokens.definitions = definitions.len(),
        tokens.generated = fallbacks.len(),
        tokens.errors = errors.len(),
        "Fallback region regenerated"
    );

    ProcessOutput {
        updated_text,
        generated_count: fallbacks.len(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
:root {
  --primary: oklch(0.68 0.18 130); /* brand green */
  --background: oklch(1 0 0);
  --broken: oklch(1.2 0.1 400); /* too bright */
  --garbled: oklch(0.5 abc 20);
  --radius: 0.5rem;

  /* @generated hsl-fallbacks:start */
  --stale-hsl: 1 2% 3%;
  /* @generated hsl-fallbacks:end */
}
";

    #[test]
    fn scan_finds_definitions_in_order() {
        let defs = extract_definitions(SAMPLE);
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["primary", "background", "broken", "garbled"]);
        assert_eq!(defs[0].line, 2);
        assert_eq!(defs[0].literal, "oklch(0.68 0.18 130)");
        assert_eq!(defs[0].comment.as_deref(), Some("brand green"));
        assert_eq!(defs[1].comment, None);
    }

    #[test]
    fn process_replaces_region_and_collects_errors() {
        let out = process_definitions(SAMPLE);
        assert_eq!(out.generated_count, 2);
        assert!(out.spliced());
        assert_eq!(out.errors.len(), 2);
        assert!(matches!(
            &out.errors[0],
            ProcessError::Definition { line: 4, name, error: OklchError::Range(v) }
                if name == "broken" && v.len() == 2
        ));
        assert!(matches!(
            &out.errors[1],
            ProcessError::Definition { line: 5, error: OklchError::Parse(_), .. }
        ));

        assert!(out
            .updated_text
            .contains("  --primary-hsl: 82 87% 36%; /* brand green */\n"));
        assert!(out
            .updated_text
            .contains("  --background-hsl: 0 0% 100%; /* fallback for --background */\n"));
        assert!(!out.updated_text.contains("stale"));
        assert!(out.updated_text.starts_with(":root {\n  --primary: oklch(0.68 0.18 130);"));
        assert!(out.updated_text.ends_with("  /* @generated hsl-fallbacks:end */\n}\n"));
    }

    #[test]
    fn generated_region_snapshot() {
        let out = process_definitions(SAMPLE);
        let start = out.updated_text.find(GENERATED_START).unwrap();
        let end = out.updated_text.find(GENERATED_END).unwrap() + GENERATED_END.len();
        insta::assert_snapshot!(&out.updated_text[start..end], @r"
        /* @generated hsl-fallbacks:start */
          --primary-hsl: 82 87% 36%; /* brand green */
          --background-hsl: 0 0% 100%; /* fallback for --background */
          /* @generated hsl-fallbacks:end */
        ");
    }

    #[test]
    fn missing_markers_fail_closed() {
        let text = "--primary: oklch(0.68 0.18 130);\n";
        let out = process_definitions(text);
        assert_eq!(out.updated_text, text);
        assert_eq!(out.generated_count, 0);
        assert!(!out.spliced());
        assert_eq!(
            out.errors,
            vec![ProcessError::Markers(MarkerError::MissingStart(
                GENERATED_START.to_string()
            ))]
        );
    }

    #[test]
    fn missing_end_marker_fails_closed() {
        let text = format!("--a: oklch(0.5 0.1 20);\n{GENERATED_START}\n--a-hsl: 1 1% 1%;\n");
        let out = process_definitions(&text);
        assert_eq!(out.updated_text, text);
        assert!(matches!(
            out.errors.last(),
            Some(ProcessError::Markers(MarkerError::MissingEnd(_)))
        ));
    }

    #[test]
    fn reversed_markers_fail_closed() {
        let text = format!("{GENERATED_END}\n--a: oklch(0.5 0.1 20);\n{GENERATED_START}\n");
        let out = process_definitions(&text);
        assert_eq!(out.updated_text, text);
        assert!(matches!(
            out.errors.last(),
            Some(ProcessError::Markers(MarkerError::OutOfOrder { .. }))
        ));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let first = process_definitions(SAMPLE);
        let second = process_definitions(&first.updated_text);
        assert_eq!(second.updated_text, first.updated_text);
        assert_eq!(second.generated_count, first.generated_count);
    }

    #[test]
    fn definitions_inside_region_are_ignored() {
        let text = format!(
            "{GENERATED_START}\n--inner: oklch(0.5 0.1 20);\n{GENERATED_END}\n--outer: oklch(0 0 0);\n"
        );
        let defs = extract_definitions(&text);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "outer");

        let out = process_definitions(&text);
        assert_eq!(
            out.updated_text,
            format!(
                "{GENERATED_START}\n--outer-hsl: 0 0% 0%; /* fallback for --outer */\n{GENERATED_END}\n--outer: oklch(0 0 0);\n"
            )
        );
    }

    #[test]
    fn crlf_line_endings_are_preserved() {
        let text = format!(
            "--a: oklch(1 0 0);\r\n{GENERATED_START}\r\n{GENERATED_END}\r\n"
        );
        let out = process_definitions(&text);
        assert_eq!(
            out.updated_text,
            format!(
                "--a: oklch(1 0 0);\r\n{GENERATED_START}\r\n--a-hsl: 0 0% 100%; /* fallback for --a */\r\n{GENERATED_END}\r\n"
            )
        );
    }

    #[test]
    fn custom_markers() {
        let markers = Markers::new("// BEGIN", "// END");
        let text = "--a: oklch(0 0 0);\n// BEGIN\n// END\n";
        let out = process_definitions_with(text, &markers);
        assert!(out.is_clean());
        assert_eq!(out.generated_count, 1);
        assert!(out.updated_text.contains("// BEGIN\n--a-hsl: 0 0% 0%;"));
    }

    #[test]
    fn non_matching_lines_pass_through() {
        let text = format!(
            "--a: oklch(var(--l) 0.1 20);\n--b: oklch(0.5 0.1 20)\n{GENERATED_START}\n{GENERATED_END}\n"
        );
        let out = process_definitions(&text);
        assert!(out.is_clean());
        assert_eq!(out.generated_count, 0);
        assert_eq!(out.updated_text, text);
    }
}
