//! Color value types and the OKLCH → sRGB → HSL conversion pipeline.
//!
//! This module provides the numeric foundation of the crate:
//! - [`OklchColor`] - validated perceptual color (the canonical definition)
//! - [`OklchLiteral`] - a parsed but not yet range-checked OKLCH triple
//! - [`Oklab`] - Cartesian intermediate between OKLCH and linear RGB
//! - [`RgbColor`] - 8-bit gamma-encoded sRGB
//! - [`HslColor`] - integer HSL, the legacy fallback representation
//!
//! # Pipeline
//!
//! ```text
//! oklch(L C H) ─▶ Oklab ─▶ LMS ─▶ linear sRGB ─▶ sRGB (gamma) ─▶ RGB8 ─▶ HSL
//! ```
//!
//! The Oklab matrices are Björn Ottosson's published coefficients
//! (<https://bottosson.github.io/posts/oklab/>) and the transfer function
//! uses the sRGB breakpoint `0.0031308`. Previously generated fallback text
//! depends on these exact constants.
//!
//! # Example
//!
//! ```rust
//! use prism::{OklchColor, oklch_to_hsl_string};
//!
//! let green = OklchColor::parse("oklch(0.68 0.18 130)").unwrap();
//! assert_eq!(green.to_rgb().to_hex(), "#72ad0c");
//! assert_eq!(oklch_to_hsl_string(0.68, 0.18, 130.0), "82 87% 36%");
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{OklchError, OklchField, ParseError, RangeViolation};

/// Allowed OKLCH lightness.
pub const LIGHTNESS_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// Allowed OKLCH chroma.
pub const CHROMA_RANGE: RangeInclusive<f64> = 0.0..=0.4;

/// Allowed OKLCH hue in degrees. The upper bound is inclusive.
pub const HUE_RANGE: RangeInclusive<f64> = 0.0..=360.0;

const OKLCH_SHAPE: &str = "oklch(L C H)";
const HSL_SHAPE: &str = "H S% L%";
const HEX_SHAPE: &str = "#rrggbb or #rgb";

// =============================================================================
// Value types
// =============================================================================

/// A well-formed OKLCH triple whose ranges have not been checked.
///
/// Produced by [`parse_oklch`]; pass it to [`validate_oklch_ranges`] for a
/// complete diagnostic, or convert it with [`OklchColor::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OklchLiteral {
    pub lightness: f64,
    pub chroma: f64,
    pub hue: f64,
}

impl OklchLiteral {
    pub const fn new(lightness: f64, chroma: f64, hue: f64) -> Self {
        Self {
            lightness,
            chroma,
            hue,
        }
    }
}

impl fmt::Display for OklchLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oklch({} {} {})", self.lightness, self.chroma, self.hue)
    }
}

/// A perceptual color whose components are known to be in range.
///
/// There is no way to build an `OklchColor` with out-of-range components:
/// every constructor validates, rejecting rather than clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OklchColor {
    lightness: f64,
    chroma: f64,
    hue: f64,
}

impl OklchColor {
    /// Create a validated color from its components.
    ///
    /// # Errors
    ///
    /// Returns every [`RangeViolation`] found, not just the first.
    pub fn new(lightness: f64, chroma: f64, hue: f64) -> Result<Self, Vec<RangeViolation>> {
        Self::try_from(OklchLiteral::new(lightness, chroma, hue))
    }

    /// Parse and validate an `oklch(L C H)` literal.
    ///
    /// # Errors
    ///
    /// Returns [`OklchError::Parse`] for malformed text and
    /// [`OklchError::Range`] for out-of-domain components.
    pub fn parse(text: &str) -> Result<Self, OklchError> {
        let literal = parse_oklch(text)?;
        Ok(Self::try_from(literal)?)
    }

    pub const fn lightness(&self) -> f64 {
        self.lightness
    }

    pub const fn chroma(&self) -> f64 {
        self.chroma
    }

    pub const fn hue(&self) -> f64 {
        self.hue
    }

    pub fn to_oklab(&self) -> Oklab {
        oklch_to_oklab(self.lightness, self.chroma, self.hue)
    }

    pub fn to_rgb(&self) -> RgbColor {
        oklch_to_rgb(self.lightness, self.chroma, self.hue)
    }

    pub fn to_hsl(&self) -> HslColor {
        rgb_to_hsl(self.to_rgb())
    }

    /// The bare `H S% L%` fallback text for this color.
    pub fn to_hsl_string(&self) -> String {
        self.to_hsl().to_string()
    }
}

impl TryFrom<OklchLiteral> for OklchColor {
    type Error = Vec<RangeViolation>;

    fn try_from(literal: OklchLiteral) -> Result<Self, Self::Error> {
        validate_oklch_ranges(&literal)?;
        Ok(Self {
            lightness: literal.lightness,
            chroma: literal.chroma,
            hue: literal.hue,
        })
    }
}

impl From<OklchColor> for OklchLiteral {
    fn from(color: OklchColor) -> Self {
        Self::new(color.lightness, color.chroma, color.hue)
    }
}

impl FromStr for OklchColor {
    type Err = OklchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OklchColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        OklchLiteral::from(*self).fmt(f)
    }
}

/// A color in the Oklab space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Oklab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// An 8-bit sRGB color. Always derived, never authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Shape`] when the text is not a hex color.
    pub fn from_hex(text: &str) -> Result<Self, ParseError> {
        let raw = text.trim();
        let hex = raw
            .strip_prefix('#')
            .ok_or_else(|| ParseError::shape(HEX_SHAPE, raw))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::shape(HEX_SHAPE, raw));
        }
        let channel =
            |s: &str| u8::from_str_radix(s, 16).map_err(|_| ParseError::shape(HEX_SHAPE, raw));
        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Ok(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            _ => Err(ParseError::shape(HEX_SHAPE, raw)),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Integer HSL: hue in `[0, 360)`, saturation and lightness in `[0, 100]`.
///
/// Displays as the bare triplet `H S% L%` used inside CSS custom properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct HslColor {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl HslColor {
    pub const fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.hue, self.saturation, self.lightness)
    }
}

// =============================================================================
// OKLCH → Oklab → linear sRGB → sRGB
// =============================================================================

/// Convert cylindrical OKLCH to Cartesian Oklab.
pub fn oklch_to_oklab(l: f64, c: f64, h: f64) -> Oklab {
    let h_rad = h.to_radians();
    Oklab {
        l,
        a: c * h_rad.cos(),
        b: c * h_rad.sin(),
    }
}

/// Convert Oklab to linear sRGB via the LMS cone space.
///
/// Results may fall outside `[0, 1]` for out-of-gamut colors.
pub fn oklab_to_linear_srgb(lab: Oklab) -> [f64; 3] {
    let Oklab { l, a, b } = lab;

    let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

    let l3 = l_ * l_ * l_;
    let m3 = m_ * m_ * m_;
    let s3 = s_ * s_ * s_;

    [
        4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
        -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
        -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701_0 * s3,
    ]
}

/// Apply the sRGB transfer function to one linear channel.
pub fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Remove the sRGB transfer function from one encoded channel.
pub fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.040_45 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn to_channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert OKLCH components to 8-bit sRGB.
///
/// Each channel is gamma-encoded, clamped to `[0, 1]`, then scaled and
/// rounded, so out-of-gamut colors saturate rather than wrap.
pub fn oklch_to_rgb(l: f64, c: f64, h: f64) -> RgbColor {
    let [r, g, b] = oklab_to_linear_srgb(oklch_to_oklab(l, c, h));
    RgbColor::new(
        to_channel(linear_to_srgb(r)),
        to_channel(linear_to_srgb(g)),
        to_channel(linear_to_srgb(b)),
    )
}

// =============================================================================
// RGB ↔ HSL
// =============================================================================

/// Unrounded HSL decomposition: hue in degrees `[0, 360)`, saturation and
/// lightness as fractions in `[0, 1]`.
pub fn rgb_to_hsl_components(rgb: RgbColor) -> (f64, f64, f64) {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = f64::midpoint(max, min);

    let d = max - min;
    if d == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s, l)
}

/// Convert 8-bit sRGB to integer HSL, rounding to the nearest degree and percent.
pub fn rgb_to_hsl(rgb: RgbColor) -> HslColor {
    let (h, s, l) = rgb_to_hsl_components(rgb);
    // 359.5 and above rounds onto the wheel's origin
    let hue = (h.round() as u16) % 360;
    HslColor::new(hue, (s * 100.0).round() as u8, (l * 100.0).round() as u8)
}

/// Convert fractional HSL back to 8-bit sRGB using the standard formula.
///
/// `h` is in degrees and wraps; `s` and `l` are clamped to `[0, 1]`.
pub fn hsl_components_to_rgb(h: f64, s: f64, l: f64) -> RgbColor {
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = to_channel(l);
        return RgbColor::new(v, v, v);
    }

    let h = h.rem_euclid(360.0) / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    RgbColor::new(
        to_channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_channel(hue_to_rgb(p, q, h)),
        to_channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    )
}

/// Convert integer HSL back to 8-bit sRGB.
pub fn hsl_to_rgb(hsl: HslColor) -> RgbColor {
    hsl_components_to_rgb(
        f64::from(hsl.hue),
        f64::from(hsl.saturation) / 100.0,
        f64::from(hsl.lightness) / 100.0,
    )
}

/// The canonical generated fallback text: a bare `H S% L%` triplet.
pub fn oklch_to_hsl_string(l: f64, c: f64, h: f64) -> String {
    rgb_to_hsl(oklch_to_rgb(l, c, h)).to_string()
}

// =============================================================================
// Parsing and validation
// =============================================================================

fn parse_component(component: &str, input: &str) -> Result<f64, ParseError> {
    let value: f64 = component.parse().map_err(|_| ParseError::Number {
        component: component.to_string(),
        input: input.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ParseError::NonFinite {
            component: component.to_string(),
            input: input.to_string(),
        });
    }
    Ok(value)
}

/// Parse exactly `oklch(L C H)` with whitespace-separated decimal components.
///
/// Percentages, alpha channels, commas, and `none` are all rejected: a shape
/// that is not understood is an error, never a guess. Ranges are not checked.
///
/// # Errors
///
/// Returns [`ParseError`] describing the first problem found.
pub fn parse_oklch(text: &str) -> Result<OklchLiteral, ParseError> {
    let raw = text.trim();
    let inner = raw
        .strip_prefix("oklch(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| ParseError::shape(OKLCH_SHAPE, raw))?;

    let parts: Vec<&str> = inner.split_whitespace().collect();
    let [l, c, h] = parts.as_slice() else {
        return Err(ParseError::shape(OKLCH_SHAPE, raw));
    };

    Ok(OklchLiteral::new(
        parse_component(l, raw)?,
        parse_component(c, raw)?,
        parse_component(h, raw)?,
    ))
}

/// Check every OKLCH component against its allowed interval.
///
/// # Errors
///
/// Returns all violations at once so one malformed definition produces a
/// complete diagnostic.
pub fn validate_oklch_ranges(color: &OklchLiteral) -> Result<(), Vec<RangeViolation>> {
    let violations: Vec<RangeViolation> = [
        RangeViolation::check(OklchField::Lightness, color.lightness, &LIGHTNESS_RANGE),
        RangeViolation::check(OklchField::Chroma, color.chroma, &CHROMA_RANGE),
        RangeViolation::check(OklchField::Hue, color.hue, &HUE_RANGE),
    ]
    .into_iter()
    .flatten()
    .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn parse_percent(component: &str, input: &str) -> Result<f64, ParseError> {
    let number = component
        .strip_suffix('%')
        .ok_or_else(|| ParseError::shape(HSL_SHAPE, input))?;
    parse_component(number, input)
}

fn parse_hsl_triplet(inner: &str, input: &str) -> Result<RgbColor, ParseError> {
    let parts: Vec<&str> = inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .collect();
    let [h, s, l] = parts.as_slice() else {
        return Err(ParseError::shape(HSL_SHAPE, input));
    };
    let h = parse_component(h, input)?;
    let s = parse_percent(s, input)?;
    let l = parse_percent(l, input)?;
    Ok(hsl_components_to_rgb(h, s / 100.0, l / 100.0))
}

/// Parse any color text this crate reads or writes into sRGB.
///
/// Accepted forms: `oklch(L C H)`, `#rrggbb`, `#rgb`, `hsl(H S% L%)`, and the
/// bare generated triplet `H S% L%`. OKLCH ranges are not enforced here;
/// out-of-gamut values saturate like [`oklch_to_rgb`].
///
/// # Errors
///
/// Returns [`ParseError`] when the text matches none of the accepted forms.
pub fn parse_color(text: &str) -> Result<RgbColor, ParseError> {
    let raw = text.trim();
    if raw.starts_with("oklch(") {
        let lit = parse_oklch(raw)?;
        return Ok(oklch_to_rgb(lit.lightness, lit.chroma, lit.hue));
    }
    if raw.starts_with('#') {
        return RgbColor::from_hex(raw);
    }
    if let Some(inner) = raw
        .strip_prefix("hsl(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_hsl_triplet(inner, raw);
    }
    if raw.ends_with('%') {
        return parse_hsl_triplet(raw, raw);
    }
    Err(ParseError::shape(
        "oklch(L C H), #rrggbb, hsl(H S% L%), or H S% L%",
        raw,
    ))
}
