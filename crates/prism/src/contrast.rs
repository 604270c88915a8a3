//! WCAG 2.1 relative luminance, contrast ratio, and threshold classification.
//!
//! | Text type | AA    | AAA   |
//! |-----------|-------|-------|
//! | normal    | 4.5:1 | 7.0:1 |
//! | large     | 3.0:1 | 4.5:1 |
//! | ui        | 3.0:1 | 4.5:1 |
//!
//! A failing ratio is data, not an error. The only fallible entry point is
//! [`check_contrast`], and only because its inputs are color strings.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::color::{RgbColor, parse_color, srgb_to_linear};
use crate::error::ParseError;

/// Category of content whose legibility is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    /// Body text below 18pt (or 14pt bold).
    #[default]
    Normal,
    /// Text at least 18pt, or 14pt bold.
    Large,
    /// Non-text UI components and graphical objects.
    Ui,
}

impl TextType {
    /// Minimum ratios `(aa, aaa)` for this text type.
    pub const fn thresholds(self) -> (f64, f64) {
        match self {
            Self::Normal => (4.5, 7.0),
            Self::Large | Self::Ui => (3.0, 4.5),
        }
    }

    /// Minimum ratio for the given conformance level.
    pub const fn required(self, level: WcagLevel) -> f64 {
        let (aa, aaa) = self.thresholds();
        match level {
            WcagLevel::Aa => aa,
            WcagLevel::Aaa => aaa,
        }
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Large => "large",
            Self::Ui => "ui",
        })
    }
}

/// Error returned when parsing an unknown text type or level name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseContrastOptionError {
    kind: &'static str,
    value: String,
}

impl FromStr for TextType {
    type Err = ParseContrastOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "large" => Ok(Self::Large),
            "ui" | "graphics" => Ok(Self::Ui),
            _ => Err(ParseContrastOptionError {
                kind: "text type",
                value: s.to_string(),
            }),
        }
    }
}

/// A WCAG conformance target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum WcagLevel {
    #[default]
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "AAA")]
    Aaa,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Aa => "AA",
            Self::Aaa => "AAA",
        })
    }
}

impl FromStr for WcagLevel {
    type Err = ParseContrastOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aa" => Ok(Self::Aa),
            "aaa" => Ok(Self::Aaa),
            _ => Err(ParseContrastOptionError {
                kind: "WCAG level",
                value: s.to_string(),
            }),
        }
    }
}

/// The highest tier a color pair actually achieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContrastLevel {
    Fail,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "AAA")]
    Aaa,
}

impl fmt::Display for ContrastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fail => "Fail",
            Self::Aa => "AA",
            Self::Aaa => "AAA",
        })
    }
}

/// Outcome of checking one foreground/background pair.
///
/// Recomputed on demand; never cached across color changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastResult {
    /// Contrast ratio in `[1, 21]`.
    pub ratio: f64,
    pub meets_aa: bool,
    pub meets_aaa: bool,
    /// Highest tier met.
    pub level: ContrastLevel,
    /// Minimum ratio for the requested target.
    pub required: f64,
    /// Present only when the requested target is not met.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl ContrastResult {
    /// Returns true if the requested target level was met.
    pub fn passes(&self) -> bool {
        self.recommendation.is_none()
    }
}

/// Perceived brightness of an 8-bit color, from 0 for black to 1 for white.
///
/// Channels are decoded with [`srgb_to_linear`] before weighting.
pub fn relative_luminance(rgb: RgbColor) -> f64 {
    let r = srgb_to_linear(f64::from(rgb.r) / 255.0);
    let g = srgb_to_linear(f64::from(rgb.g) / 255.0);
    let b = srgb_to_linear(f64::from(rgb.b) / 255.0);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Contrast between two colors, from 1 (identical) to 21 (black on white).
///
/// Symmetric in its arguments.
pub fn contrast_ratio(fg: RgbColor, bg: RgbColor) -> f64 {
    let a = relative_luminance(fg);
    let b = relative_luminance(bg);
    let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
    ((lighter + 0.05) / (darker + 0.05)).clamp(1.0, 21.0)
}

/// Classify a pair against the thresholds for `text_type`.
///
/// `level` reports the highest tier met regardless of `target`; the
/// recommendation is only filled in when `target` itself is missed.
pub fn validate_contrast(
    fg: RgbColor,
    bg: RgbColor,
    text_type: TextType,
    target: WcagLevel,
) -> ContrastResult {
    let ratio = contrast_ratio(fg, bg);
    let (aa, aaa) = text_type.thresholds();
    let meets_aa = ratio >= aa;
    let meets_aaa = ratio >= aaa;
    let level = if meets_aaa {
        ContrastLevel::Aaa
    } else if meets_aa {
        ContrastLevel::Aa
    } else {
        ContrastLevel::Fail
    };

    let required = text_type.required(target);
    let recommendation = (ratio < required).then(|| {
        format!(
            "ratio {ratio:.2}:1 is {:.2} short of the {target} minimum of {required:.1}:1 for {text_type} text",
            required - ratio
        )
    });

    tracing::trace!(
        contrast.fg = %fg.to_hex(),
        contrast.bg = %bg.to_hex(),
        contrast.ratio = ratio,
        contrast.level = %level,
        "Contrast checked"
    );

    ContrastResult {
        ratio,
        meets_aa,
        meets_aaa,
        level,
        required,
        recommendation,
    }
}

/// [`validate_contrast`] over color strings in any form [`parse_color`] accepts.
///
/// # Errors
///
/// Returns [`ParseError`] if either color cannot be parsed.
pub fn check_contrast(
    fg: &str,
    bg: &str,
    text_type: TextType,
    target: WcagLevel,
) -> Result<ContrastResult, ParseError> {
    let fg = parse_color(fg)?;
    let bg = parse_color(bg)?;
    Ok(validate_contrast(fg, bg, text_type, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() < tolerance
    }

    // =========================================================================
    // Luminance
    // =========================================================================

    #[test]
    fn luminance_spans_black_to_white() {
        assert!(close(relative_luminance(RgbColor::BLACK), 0.0, 1e-9));
        let white = relative_luminance(RgbColor::WHITE);
        assert!(close(white, 1.0, 1e-9), "white: {white}");
    }

    #[test]
    fn primaries_weigh_by_channel() {
        let red = relative_luminance(RgbColor::new(255, 0, 0));
        let green = relative_luminance(RgbColor::new(0, 255, 0));
        let blue = relative_luminance(RgbColor::new(0, 0, 255));
        assert!(close(red, 0.2126, 1e-4), "red: {red}");
        assert!(close(green, 0.7152, 1e-4), "green: {green}");
        assert!(close(blue, 0.0722, 1e-4), "blue: {blue}");
    }

    // =========================================================================
    // Ratio
    // =========================================================================

    #[test]
    fn ratio_extremes() {
        let max = contrast_ratio(RgbColor::BLACK, RgbColor::WHITE);
        assert!(close(max, 21.0, 1e-9), "max: {max}");
        let brand = RgbColor::new(114, 173, 12);
        assert!(close(contrast_ratio(brand, brand), 1.0, 1e-9));
    }

    #[test]
    fn ratio_ignores_argument_order() {
        let rose = RgbColor::new(204, 51, 77);
        let navy = RgbColor::new(26, 26, 102);
        assert!(close(contrast_ratio(rose, navy), contrast_ratio(navy, rose), 1e-12));
    }

    #[test]
    fn mid_gray_on_white() {
        // #777777 on white is the classic just-below-AA case (~4.48:1).
        let ratio = contrast_ratio(RgbColor::new(0x77, 0x77, 0x77), RgbColor::WHITE);
        assert!(ratio > 4.4 && ratio < 4.5, "ratio: {ratio}");
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn black_on_white_meets_aaa() {
        let result = validate_contrast(
            RgbColor::BLACK,
            RgbColor::WHITE,
            TextType::Normal,
            WcagLevel::Aaa,
        );
        assert!(close(result.ratio, 21.0, 0.01));
        assert!(result.meets_aa);
        assert!(result.meets_aaa);
        assert_eq!(result.level, ContrastLevel::Aaa);
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn gray_fails_normal_but_passes_large() {
        let fg = RgbColor::new(0x77, 0x77, 0x77);
        let normal = validate_contrast(fg, RgbColor::WHITE, TextType::Normal, WcagLevel::Aa);
        assert_eq!(normal.level, ContrastLevel::Fail);
        assert!(!normal.passes());
        let rec = normal.recommendation.unwrap();
        assert!(rec.contains("AA minimum of 4.5:1"), "{rec}");

        let large = validate_contrast(fg, RgbColor::WHITE, TextType::Large, WcagLevel::Aa);
        assert_eq!(large.level, ContrastLevel::Aa);
        assert!(large.passes());
    }

    #[test]
    fn level_reports_highest_tier_even_below_target() {
        // ~5.7:1 is AA for normal text but misses AAA.
        let fg = RgbColor::new(0x66, 0x66, 0x66);
        let result = validate_contrast(fg, RgbColor::WHITE, TextType::Normal, WcagLevel::Aaa);
        assert_eq!(result.level, ContrastLevel::Aa);
        assert!(result.meets_aa);
        assert!(!result.meets_aaa);
        assert!((result.required - 7.0).abs() < f64::EPSILON);
        assert!(result.recommendation.is_some());
    }

    #[test]
    fn ui_thresholds_match_large() {
        assert_eq!(TextType::Ui.thresholds(), TextType::Large.thresholds());
        assert_eq!(TextType::Normal.thresholds(), (4.5, 7.0));
    }

    #[test]
    fn check_contrast_parses_strings() {
        let result =
            check_contrast("#000", "oklch(1 0 0)", TextType::Normal, WcagLevel::Aa).unwrap();
        assert_eq!(result.level, ContrastLevel::Aaa);
        assert!(check_contrast("black", "#fff", TextType::Normal, WcagLevel::Aa).is_err());
    }

    #[test]
    fn options_parse_case_insensitively() {
        assert_eq!("LARGE".parse::<TextType>().unwrap(), TextType::Large);
        assert_eq!("graphics".parse::<TextType>().unwrap(), TextType::Ui);
        assert_eq!("aaa".parse::<WcagLevel>().unwrap(), WcagLevel::Aaa);
        let err = "huge".parse::<TextType>().unwrap_err();
        assert_eq!(err.to_string(), "invalid text type: \"huge\"");
    }
}
