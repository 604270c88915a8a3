//! Theme completeness and legibility checks.
//!
//! [`ThemeAuditor`] reads a checklist of required tokens and a list of
//! foreground/background pairings through a [`VariableRegistry`] and reports
//! every problem it finds in one [`ThemeReport`]. There is no warning-only
//! mode: any finding makes the report invalid.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::color::{RgbColor, parse_color};
use crate::contrast::{TextType, WcagLevel, validate_contrast};
use crate::error::ResolveError;
use crate::registry::{StyleProvider, VariableRegistry, normalize_name};

/// Tokens every complete theme defines.
pub const DEFAULT_REQUIRED: &[&str] = &[
    "background",
    "foreground",
    "card",
    "card-foreground",
    "popover",
    "popover-foreground",
    "primary",
    "primary-foreground",
    "secondary",
    "secondary-foreground",
    "muted",
    "muted-foreground",
    "accent",
    "accent-foreground",
    "destructive",
    "destructive-foreground",
    "border",
    "input",
    "ring",
];

/// Semantic pairings whose contrast must reach AA for normal text.
pub const DEFAULT_PAIRS: &[(&str, &str)] = &[
    ("foreground", "background"),
    ("card-foreground", "card"),
    ("popover-foreground", "popover"),
    ("primary-foreground", "primary"),
    ("secondary-foreground", "secondary"),
    ("muted-foreground", "muted"),
    ("accent-foreground", "accent"),
    ("destructive-foreground", "destructive"),
];

/// A foreground token drawn on a background token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContrastPair {
    pub foreground: String,
    pub background: String,
}

impl ContrastPair {
    pub fn new(foreground: &str, background: &str) -> Self {
        Self {
            foreground: normalize_name(foreground).to_string(),
            background: normalize_name(background).to_string(),
        }
    }
}

/// A pairing whose measured ratio is below the required minimum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastIssue {
    pub fg: String,
    pub bg: String,
    pub ratio: f64,
    pub required: f64,
}

/// A token that is defined but cannot be used as a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidToken {
    pub name: String,
    /// The resolved value, when resolution got that far.
    pub value: Option<String>,
    pub reason: String,
}

/// Outcome of one audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeReport {
    pub missing: Vec<String>,
    pub contrast_issues: Vec<ContrastIssue>,
    pub invalid: Vec<InvalidToken>,
    pub is_valid: bool,
}

impl ThemeReport {
    fn new(
        missing: Vec<String>,
        contrast_issues: Vec<ContrastIssue>,
        invalid: Vec<InvalidToken>,
    ) -> Self {
        let is_valid = missing.is_empty() && contrast_issues.is_empty() && invalid.is_empty();
        Self {
            missing,
            contrast_issues,
            invalid,
            is_valid,
        }
    }

    /// Total number of findings.
    pub fn problem_count(&self) -> usize {
        self.missing.len() + self.contrast_issues.len() + self.invalid.len()
    }
}

/// What one token resolved to.
#[derive(Debug, Clone)]
enum Lookup {
    Color(RgbColor),
    Missing,
    Invalid,
}

/// Checks a theme against a required-token list and contrast pairings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeAuditor {
    required: Vec<String>,
    pairs: Vec<ContrastPair>,
}

impl Default for ThemeAuditor {
    fn default() -> Self {
        Self::new(
            DEFAULT_REQUIRED.iter().copied(),
            DEFAULT_PAIRS.iter().copied(),
        )
    }
}

impl ThemeAuditor {
    /// Build an auditor from names with or without the leading `--`.
    pub fn new<'a>(
        required: impl IntoIterator<Item = &'a str>,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            required: required
                .into_iter()
                .map(|name| normalize_name(name).to_string())
                .collect(),
            pairs: pairs
                .into_iter()
                .map(|(fg, bg)| ContrastPair::new(fg, bg))
                .collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn pairs(&self) -> &[ContrastPair] {
        &self.pairs
    }

    /// Audit the theme visible through `registry`.
    ///
    /// Each token is resolved through its `var()` chain and parsed as a color.
    /// A pairing is only measured when both of its tokens yield a color; a
    /// token that does not is reported once, as missing or invalid.
    pub fn audit<P: StyleProvider>(&self, registry: &mut VariableRegistry<P>) -> ThemeReport {
        let mut seen: HashMap<String, Lookup> = HashMap::new();
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        let mut lookup = |name: &str, registry: &mut VariableRegistry<P>| -> Lookup {
            if let Some(found) = seen.get(name) {
                return found.clone();
            }
            let found = match registry.resolve(name) {
                Ok(value) => match parse_color(&value) {
                    Ok(rgb) => Lookup::Color(rgb),
                    Err(error) => {
                        invalid.push(InvalidToken {
                            name: name.to_string(),
                            value: Some(value),
                            reason: error.to_string(),
                        });
                        Lookup::Invalid
                    }
                },
                Err(ResolveError::Missing(target)) if target == name => {
                    missing.push(name.to_string());
                    Lookup::Missing
                }
                Err(error) => {
                    invalid.push(InvalidToken {
                        name: name.to_string(),
                        value: None,
                        reason: error.to_string(),
                    });
                    Lookup::Invalid
                }
            };
            seen.insert(name.to_string(), found.clone());
            found
        };

        for name in &self.required {
            lookup(name, registry);
        }

        let mut contrast_issues = Vec::new();
        for pair in &self.pairs {
            let fg = lookup(&pair.foreground, registry);
            let bg = lookup(&pair.background, registry);
            let (Lookup::Color(fg), Lookup::Color(bg)) = (fg, bg) else {
                continue;
            };
            let result = validate_contrast(fg, bg, TextType::Normal, WcagLevel::Aa);
            debug!(
                audit.fg = %pair.foreground,
                audit.bg = %pair.background,
                audit.ratio = result.ratio,
                "Pair measured"
            );
            if !result.meets_aa {
                contrast_issues.push(ContrastIssue {
                    fg: pair.foreground.clone(),
                    bg: pair.background.clone(),
                    ratio: result.ratio,
                    required: result.required,
                });
            }
        }

        let report = ThemeReport::new(missing, contrast_issues, invalid);
        info!(
            audit.missing = report.missing.len(),
            audit.contrast_issues = report.contrast_issues.len(),
            audit.invalid = report.invalid.len(),
            audit.valid = report.is_valid,
            "Theme audited"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MapProvider;

    fn complete_theme() -> MapProvider {
        let mut provider = MapProvider::new();
        for name in DEFAULT_REQUIRED {
            let value = if name.ends_with("-foreground") || *name == "foreground" {
                "#000000"
            } else {
                "#ffffff"
            };
            provider.insert(name, value);
        }
        provider
    }

    #[test]
    fn complete_theme_is_valid() {
        let mut registry = VariableRegistry::new(complete_theme());
        let report = ThemeAuditor::default().audit(&mut registry);
        assert!(report.is_valid, "{report:?}");
        assert_eq!(report.problem_count(), 0);
    }

    #[test]
    fn missing_tokens_are_listed_in_checklist_order() {
        let mut provider = complete_theme();
        provider.remove("ring");
        provider.remove("card");
        let mut registry = VariableRegistry::new(provider);
        let report = ThemeAuditor::default().audit(&mut registry);
        assert!(!report.is_valid);
        assert_eq!(report.missing, vec!["card", "ring"]);
        assert!(report.contrast_issues.is_empty());
    }

    #[test]
    fn low_contrast_pairs_accumulate() {
        let mut provider = complete_theme();
        provider.insert("muted-foreground", "#777777");
        provider.insert("accent-foreground", "#eeeeee");
        let mut registry = VariableRegistry::new(provider);
        let report = ThemeAuditor::default().audit(&mut registry);
        assert!(!report.is_valid);
        assert_eq!(report.contrast_issues.len(), 2);
        let issue = &report.contrast_issues[0];
        assert_eq!(issue.fg, "muted-foreground");
        assert_eq!(issue.bg, "muted");
        assert!((issue.ratio - 4.48).abs() < 0.01);
        assert!((issue.required - 4.5).abs() < f64::EPSILON);
        assert_eq!(report.contrast_issues[1].fg, "accent-foreground");
    }

    #[test]
    fn references_are_followed() {
        let mut provider = complete_theme();
        provider.insert("brand", "oklch(0.3 0.1 260)");
        provider.insert("primary", "var(--brand)");
        let mut registry = VariableRegistry::new(provider);
        let report = ThemeAuditor::default().audit(&mut registry);
        // black on a dark brand color
        assert_eq!(report.contrast_issues.len(), 1);
        assert_eq!(report.contrast_issues[0].bg, "primary");
    }

    #[test]
    fn unparseable_and_cyclic_tokens_are_invalid() {
        let mut provider = complete_theme();
        provider.insert("border", "1px solid");
        provider.insert("ring", "var(--ring-alias)");
        provider.insert("ring-alias", "var(--ring)");
        provider.insert("input", "var(--nowhere)");
        let mut registry = VariableRegistry::new(provider);
        let report = ThemeAuditor::default().audit(&mut registry);
        assert!(!report.is_valid);
        assert!(report.missing.is_empty());
        let names: Vec<_> = report.invalid.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["border", "input", "ring"]);
        assert_eq!(report.invalid[0].value.as_deref(), Some("1px solid"));
        assert!(report.invalid[2].reason.contains("cycle"));
    }

    #[test]
    fn runaway_expansion_is_invalid() {
        let mut provider = MapProvider::new();
        provider.insert("background", "var(--v0)");
        for i in 0..30 {
            provider.insert(format!("v{i}"), format!("var(--v{0}) var(--v{0})", i + 1));
        }
        provider.insert("v30", "1px");
        let mut registry = VariableRegistry::new(provider);
        let report = ThemeAuditor::new(["background"], []).audit(&mut registry);
        assert!(!report.is_valid);
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].name, "background");
        assert!(report.invalid[0].reason.contains("exceeds 4096 bytes"));
    }

    #[test]
    fn each_token_is_reported_once() {
        let auditor = ThemeAuditor::new(["fg", "--bg"], [("--fg", "bg"), ("fg", "bg")]);
        let mut registry = VariableRegistry::new(MapProvider::new());
        let report = auditor.audit(&mut registry);
        assert_eq!(report.missing, vec!["fg", "bg"]);
    }

    #[test]
    fn report_serializes() {
        let mut registry = VariableRegistry::new(MapProvider::new());
        let report = ThemeAuditor::new(["a"], []).audit(&mut registry);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["missing"][0], "a");
        assert_eq!(json["is_valid"], false);
    }
}
