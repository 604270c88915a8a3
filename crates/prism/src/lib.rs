#![forbid(unsafe_code)]
// Allow these clippy lints for numeric color code and API ergonomics
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::float_cmp)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_test_module)]

//! # Prism
//!
//! Color token tooling for themes authored in OKLCH.
//!
//! Prism converts perceptual OKLCH colors to the sRGB and HSL forms older
//! consumers need, keeps generated HSL fallbacks in sync with their OKLCH
//! sources, and checks that a theme is complete and legible:
//!
//! - [`color`]: OKLCH → OKLab → linear sRGB → sRGB → HSL, plus parsing
//! - [`contrast`]: WCAG 2.1 relative luminance and contrast tiers
//! - [`tokens`]: regenerates the HSL fallback region of a token file
//! - [`registry`]: memoized lookup of named style variables
//! - [`audit`]: required-token and contrast checks over a registry
//!
//! ## Quick Start
//!
//! ```rust
//! use prism::{oklch_to_hsl_string, process_definitions};
//!
//! assert_eq!(oklch_to_hsl_string(0.68, 0.18, 130.0), "82 87% 36%");
//!
//! let text = "\
//! --primary: oklch(0.68 0.18 130); /* brand */
//! /* @generated hsl-fallbacks:start */
//! /* @generated hsl-fallbacks:end */
//! ";
//! let out = process_definitions(text);
//! assert_eq!(out.generated_count, 1);
//! assert!(out.updated_text.contains("--primary-hsl: 82 87% 36%; /* brand */"));
//! ```
//!
//! ## Contrast
//!
//! ```rust
//! use prism::{ContrastLevel, RgbColor, TextType, WcagLevel, validate_contrast};
//!
//! let result = validate_contrast(RgbColor::BLACK, RgbColor::WHITE, TextType::Normal, WcagLevel::Aaa);
//! assert!((result.ratio - 21.0).abs() < 0.01);
//! assert_eq!(result.level, ContrastLevel::Aaa);
//! ```
//!
//! Every operation is synchronous and pure apart from the registry cache,
//! which is an owned value mutated through `&mut self`.

pub mod audit;
pub mod color;
pub mod contrast;
pub mod error;
pub mod registry;
pub mod tokens;

pub use audit::{ContrastIssue, ContrastPair, InvalidToken, ThemeAuditor, ThemeReport};
pub use color::{
    HslColor, Oklab, OklchColor, OklchLiteral, RgbColor, hsl_to_rgb, oklch_to_hsl_string,
    oklch_to_rgb, parse_color, parse_oklch, rgb_to_hsl, validate_oklch_ranges,
};
pub use contrast::{
    ContrastLevel, ContrastResult, TextType, WcagLevel, check_contrast, contrast_ratio,
    relative_luminance, validate_contrast,
};
pub use error::{
    MarkerError, OklchError, OklchField, ParseError, ProcessError, RangeViolation, ResolveError,
    UnresolvedReference,
};
pub use registry::{
    Category, DeclarationProvider, MapProvider, StyleProvider, VariableEntry, VariableRegistry,
};
pub use tokens::{
    Definition, Markers, ProcessOutput, extract_definitions, process_definitions,
    process_definitions_with,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::audit::ThemeAuditor;
    pub use crate::color::{HslColor, OklchColor, RgbColor};
    pub use crate::contrast::{TextType, WcagLevel, validate_contrast};
    pub use crate::registry::{StyleProvider, VariableRegistry};
    pub use crate::tokens::{Markers, process_definitions};
}
