//! Named style variables with memoized lookup.
//!
//! [`VariableRegistry`] sits in front of a [`StyleProvider`] (the live style
//! context of the host application) and caches what it returns. The cache is
//! an ordinary owned value, so independent registries never share state, and
//! mutation goes through `&mut self`: a host that shares one across threads
//! must wrap it in a lock.
//!
//! Reference edges between variables (`var(--name)`) are recorded on every
//! [`VariableEntry`] but never followed implicitly. [`VariableRegistry::resolve`]
//! is the only operation that walks them, and it detects cycles.
//!
//! # Example
//!
//! ```rust
//! use prism::registry::{MapProvider, VariableRegistry};
//!
//! let provider = MapProvider::from_iter([
//!     ("brand", "oklch(0.68 0.18 130)"),
//!     ("primary", "var(--brand)"),
//! ]);
//! let mut registry = VariableRegistry::new(provider);
//!
//! assert_eq!(registry.get("--primary").as_deref(), Some("var(--brand)"));
//! assert_eq!(registry.resolve("primary").unwrap(), "oklch(0.68 0.18 130)");
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::color::parse_color;
use crate::error::{ResolveError, UnresolvedReference};

/// Maximum number of `var()` hops [`VariableRegistry::resolve`] will follow.
pub const MAX_RESOLVE_DEPTH: usize = 32;

/// Maximum byte length of a value produced by [`VariableRegistry::resolve`].
pub const MAX_RESOLVED_LEN: usize = 4096;

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*--([A-Za-z0-9_-]+)").expect("reference pattern is valid")
});

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--([A-Za-z0-9_-]+)\s*:\s*([^;{}]+?)\s*;")
        .expect("declaration pattern is valid")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment pattern is valid"));

/// Strip the leading `--` of a custom property name, if present.
pub fn normalize_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("--").unwrap_or(name)
}

// =============================================================================
// Providers
// =============================================================================

/// Source of truth the registry consults on a cache miss.
///
/// Names are passed and returned without the leading `--`.
pub trait StyleProvider {
    /// Current raw value of a variable, if defined.
    fn value(&self, name: &str) -> Option<String>;

    /// Every variable name the provider knows, in a stable order.
    fn names(&self) -> Vec<String>;
}

/// In-memory provider backed by a sorted map.
#[derive(Debug, Clone, Default)]
pub struct MapProvider {
    values: BTreeMap<String, String>,
}

impl MapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a variable.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(normalize_name(name.as_ref()).to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(normalize_name(name))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for MapProvider {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut provider = Self::new();
        for (name, value) in iter {
            provider.insert(name, value);
        }
        provider
    }
}

impl StyleProvider for MapProvider {
    fn value(&self, name: &str) -> Option<String> {
        self.values.get(normalize_name(name)).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Provider built from the custom-property declarations in a stylesheet.
///
/// Comments are ignored. When a name is declared more than once the last
/// declaration wins, but the name keeps its first position.
#[derive(Debug, Clone, Default)]
pub struct DeclarationProvider {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl DeclarationProvider {
    pub fn from_text(text: &str) -> Self {
        let stripped = COMMENT_RE.replace_all(text, "");
        let mut provider = Self::default();
        for caps in DECLARATION_RE.captures_iter(&stripped) {
            let name = caps[1].to_string();
            let value = caps[2].trim().to_string();
            if provider.values.insert(name.clone(), value).is_none() {
                provider.order.push(name);
            }
        }
        debug!(
            registry.declarations = provider.order.len(),
            "Parsed custom property declarations"
        );
        provider
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl StyleProvider for DeclarationProvider {
    fn value(&self, name: &str) -> Option<String> {
        self.values.get(normalize_name(name)).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.order.clone()
    }
}

// =============================================================================
// Entries
// =============================================================================

/// Best-effort classification of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Color,
    Spacing,
    Typography,
    Sizing,
    Motion,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Color => "color",
            Self::Spacing => "spacing",
            Self::Typography => "typography",
            Self::Sizing => "sizing",
            Self::Motion => "motion",
            Self::Other => "other",
        })
    }
}

const MOTION_HINTS: &[&str] = &["duration", "delay", "ease", "transition", "animation"];
const TYPOGRAPHY_HINTS: &[&str] = &["font", "leading", "tracking", "letter", "line-height"];
const SPACING_HINTS: &[&str] = &["spacing", "space", "gap", "padding", "margin", "inset"];
const SIZING_HINTS: &[&str] = &["size", "width", "height", "radius"];
const COLOR_HINTS: &[&str] = &[
    "color",
    "background",
    "foreground",
    "primary",
    "secondary",
    "accent",
    "muted",
    "destructive",
    "border",
    "ring",
    "input",
    "card",
    "popover",
    "chart",
    "sidebar",
];

/// Label a variable by its value, then by substrings of its name.
///
/// This is a heuristic for reporting only. A value that parses as a color
/// is always [`Category::Color`]; otherwise the first matching name hint
/// wins, checked in the order motion, typography, spacing, sizing, color.
/// Anything else is [`Category::Other`].
pub fn categorize(name: &str, value: &str) -> Category {
    if parse_color(value).is_ok() {
        return Category::Color;
    }
    let name = normalize_name(name).to_lowercase();
    let matches = |hints: &[&str]| hints.iter().any(|hint| name.contains(hint));
    if matches(MOTION_HINTS) {
        Category::Motion
    } else if matches(TYPOGRAPHY_HINTS) {
        Category::Typography
    } else if matches(SPACING_HINTS) {
        Category::Spacing
    } else if matches(SIZING_HINTS) {
        Category::Sizing
    } else if matches(COLOR_HINTS) {
        Category::Color
    } else {
        Category::Other
    }
}

/// Names referenced through `var(--name)` in a raw value, in order, deduplicated.
pub fn extract_references(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    REFERENCE_RE
        .captures_iter(value)
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// One row of the registry's analysis table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableEntry {
    pub name: String,
    pub raw_value: String,
    pub category: Category,
    /// Outgoing reference edges. Possibly cyclic; never resolved here.
    pub references: Vec<String>,
}

impl VariableEntry {
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        let name = name.into();
        let raw_value = raw_value.into();
        Self {
            category: categorize(&name, &raw_value),
            references: extract_references(&raw_value),
            name,
            raw_value,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Memoizing view over a [`StyleProvider`].
#[derive(Debug)]
pub struct VariableRegistry<P> {
    provider: P,
    cache: HashMap<String, String>,
    enabled: bool,
}

impl<P: StyleProvider> VariableRegistry<P> {
    /// Create a registry with caching enabled.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
            enabled: true,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Replace the backing provider. The cache is dropped with it.
    pub fn set_provider(&mut self, provider: P) {
        self.provider = provider;
        self.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable memoization. Every [`get`](Self::get) consults the provider
    /// until caching is enabled again.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.cache.clear();
    }

    /// Number of memoized values.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Current value of a variable, from the cache when possible.
    ///
    /// Accepts names with or without the leading `--`.
    pub fn get(&mut self, name: &str) -> Option<String> {
        let key = normalize_name(name);
        if self.enabled {
            if let Some(value) = self.cache.get(key) {
                trace!(registry.key = key, "Cache hit");
                return Some(value.clone());
            }
        }

        let value = self.provider.value(key)?;
        if self.enabled {
            trace!(registry.key = key, "Cache miss");
            self.cache.insert(key.to_string(), value.clone());
        }
        Some(value)
    }

    /// Store a value in the cache, shadowing the provider until invalidated.
    ///
    /// Ignored while caching is disabled.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let key = normalize_name(name);
        if !self.enabled {
            debug!(registry.key = key, "Cache disabled, set ignored");
            return;
        }
        self.cache.insert(key.to_string(), value.into());
    }

    /// Drop one memoized value. Returns true if it was cached.
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.cache.remove(normalize_name(name)).is_some()
    }

    /// Drop every memoized value.
    pub fn clear(&mut self) {
        debug!(registry.evicted = self.cache.len(), "Cache cleared");
        self.cache.clear();
    }

    fn known_names(&self) -> Vec<String> {
        let mut names = self.provider.names();
        let known: HashSet<String> = names.iter().cloned().collect();
        let mut extra: Vec<String> = self
            .cache
            .keys()
            .filter(|key| !known.contains(*key))
            .cloned()
            .collect();
        extra.sort();
        names.extend(extra);
        names
    }

    /// Snapshot the whole table for analysis or debugging.
    ///
    /// Provider names come first in provider order, followed by any names
    /// only present through [`set`](Self::set).
    pub fn entries(&mut self) -> Vec<VariableEntry> {
        self.known_names()
            .into_iter()
            .filter_map(|name| {
                let value = self.get(&name)?;
                Some(VariableEntry::new(name, value))
            })
            .collect()
    }

    /// Reference edges whose target no variable defines.
    pub fn unresolved_references(&mut self) -> Vec<UnresolvedReference> {
        let entries = self.entries();
        let defined: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let mut warnings = Vec::new();
        for entry in &entries {
            for reference in &entry.references {
                if !defined.contains(reference.as_str()) {
                    let warning = UnresolvedReference {
                        variable: entry.name.clone(),
                        reference: reference.clone(),
                    };
                    warn!(
                        registry.variable = %warning.variable,
                        registry.reference = %warning.reference,
                        "Unresolved reference"
                    );
                    warnings.push(warning);
                }
            }
        }
        warnings
    }

    /// Follow `var()` references until a concrete value remains.
    ///
    /// `var(--x, fallback)` uses the fallback when `--x` is not defined. The
    /// walk keeps the chain of names being expanded and fails on revisiting
    /// one, so cyclic definitions return an error instead of looping. Each
    /// name is expanded at most once per call, and the expansion may not grow
    /// past [`MAX_RESOLVED_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Missing`] for an undefined name with no fallback,
    /// [`ResolveError::Cycle`] for a self-referential chain,
    /// [`ResolveError::TooDeep`] past [`MAX_RESOLVE_DEPTH`] hops, and
    /// [`ResolveError::TooLong`] when the expansion exceeds
    /// [`MAX_RESOLVED_LEN`].
    pub fn resolve(&mut self, name: &str) -> Result<String, ResolveError> {
        let name = normalize_name(name);
        let mut walk = Walk::new(name);
        self.resolve_name(name, &mut walk)
    }

    fn resolve_name(&mut self, name: &str, walk: &mut Walk) -> Result<String, ResolveError> {
        if let Some(pos) = walk.chain.iter().position(|seen| seen == name) {
            let mut cycle = walk.chain[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(ResolveError::Cycle(cycle));
        }
        if walk.chain.len() >= MAX_RESOLVE_DEPTH {
            return Err(ResolveError::TooDeep {
                name: walk.root.clone(),
                depth: MAX_RESOLVE_DEPTH,
            });
        }
        if let Some(done) = walk.resolved.get(name) {
            return Ok(done.clone());
        }

        let raw = self
            .get(name)
            .ok_or_else(|| ResolveError::Missing(name.to_string()))?;
        walk.chain.push(name.to_string());
        let resolved = self.substitute(&raw, walk);
        walk.chain.pop();
        let resolved = resolved?;
        walk.resolved.insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn substitute(&mut self, raw: &str, walk: &mut Walk) -> Result<String, ResolveError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find("var(") {
            out.push_str(&rest[..start]);
            let body_start = start + "var(".len();
            let Some(body_len) = matching_paren(&rest[body_start..]) else {
                // Unbalanced: keep the remainder verbatim.
                out.push_str(&rest[start..]);
                return walk.check_len(out);
            };
            let body = &rest[body_start..body_start + body_len];
            let expanded = self.expand_var(body, walk)?;
            out.push_str(&expanded);
            out = walk.check_len(out)?;
            rest = &rest[body_start + body_len + 1..];
        }
        out.push_str(rest);
        walk.check_len(out)
    }

    fn expand_var(&mut self, body: &str, walk: &mut Walk) -> Result<String, ResolveError> {
        let (name, fallback) = match body.split_once(',') {
            Some((name, fallback)) => (name, Some(fallback.trim())),
            None => (body, None),
        };
        match self.resolve_name(normalize_name(name), walk) {
            Err(ResolveError::Missing(missing)) => match fallback {
                Some(fallback) => self.substitute(fallback, walk),
                None => Err(ResolveError::Missing(missing)),
            },
            other => other,
        }
    }
}

/// State of one [`VariableRegistry::resolve`] call.
struct Walk {
    root: String,
    /// Names currently being expanded, outermost first.
    chain: Vec<String>,
    /// Names already expanded during this call.
    resolved: HashMap<String, String>,
}

impl Walk {
    fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            chain: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    fn check_len(&self, text: String) -> Result<String, ResolveError> {
        if text.len() > MAX_RESOLVED_LEN {
            return Err(ResolveError::TooLong {
                name: self.root.clone(),
                limit: MAX_RESOLVED_LEN,
            });
        }
        Ok(text)
    }
}

/// Byte length of `s` up to the `)` closing an already-open parenthesis.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}
