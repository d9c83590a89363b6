//! Color modes, color parsing and color transforms.
//!
//! # Modules
//!
//! - [`matrix`]: 4×5 color matrices for filter-based recoloring
//! - [`rewrite`]: SVG fill/stroke rewriting and filter injection
//!
//! A [`ColorTag`] names one requested color variant. It drives both the
//! vector side ([`rewrite::recolor`], [`rewrite::apply_filter`]) and the
//! pixel side ([`ColorTag::apply_pixel`]).

pub mod matrix;
pub mod rewrite;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use matrix::ColorMatrix;
pub use rewrite::{apply_filter, recolor, solid_paint};

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const GRAY: Rgb = Rgb::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => Some(Self::new(
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            )),
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
                Some(Self::new(digit(0)?, digit(1)?, digit(2)?))
            }
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `255 − channel` on each channel.
    pub const fn invert(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Channels as fractions in `0..=1`.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }

    /// Channel-wise average of two colors, rounded.
    pub fn average(self, other: Rgb) -> Self {
        let mid = |a: u8, b: u8| ((u16::from(a) + u16::from(b) + 1) / 2) as u8;
        Self::new(mid(self.r, other.r), mid(self.g, other.g), mid(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A parsed CSS color with its alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub rgb: Rgb,
    pub alpha: f64,
}

impl Color {
    /// Parse hex, a named color, `rgb()` or `rgba()`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Rgb::from_hex(value).map(Self::opaque);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(args);
        }
        named_color(&lower).map(Self::opaque)
    }

    pub const fn opaque(rgb: Rgb) -> Self {
        Self { rgb, alpha: 1.0 }
    }

    /// Serialize back: hex when opaque, `rgba()` otherwise.
    pub fn to_css(self) -> String {
        if self.alpha >= 1.0 {
            self.rgb.to_hex()
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.rgb.r, self.rgb.g, self.rgb.b, self.alpha
            )
        }
    }
}

fn parse_rgb_function(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? * 2.55,
            None => s.parse::<f64>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => match a.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? / 100.0,
            None => a.parse::<f64>().ok()?,
        },
        None => 1.0,
    };
    Some(Color {
        rgb: Rgb::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?),
        alpha: alpha.clamp(0.0, 1.0),
    })
}

/// CSS basic color keywords plus a few common extended names.
fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "blue" => Rgb::new(0, 0, 255),
        "lime" => Rgb::new(0, 255, 0),
        "yellow" => Rgb::new(255, 255, 0),
        "cyan" | "aqua" => Rgb::new(0, 255, 255),
        "magenta" | "fuchsia" => Rgb::new(255, 0, 255),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "silver" => Rgb::new(192, 192, 192),
        "maroon" => Rgb::new(128, 0, 0),
        "olive" => Rgb::new(128, 128, 0),
        "navy" => Rgb::new(0, 0, 128),
        "purple" => Rgb::new(128, 0, 128),
        "teal" => Rgb::new(0, 128, 128),
        "orange" => Rgb::new(255, 165, 0),
        _ => return None,
    };
    Some(rgb)
}

/// One requested color variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorTag {
    Original,
    Black,
    White,
    Grayscale,
    Inverted,
    Custom(Rgb),
    /// A color string that names no known mode; transforms leave the
    /// input untouched.
    Unrecognized(String),
}

impl ColorTag {
    /// Parse a mode name (case-insensitive), `custom:#rrggbb` or a bare hex
    /// color. Anything else becomes [`ColorTag::Unrecognized`].
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "original" => return Self::Original,
            "black" => return Self::Black,
            "white" => return Self::White,
            "grayscale" | "greyscale" => return Self::Grayscale,
            "inverted" | "invert" => return Self::Inverted,
            _ => {}
        }
        let hex = trimmed
            .get(..7)
            .filter(|prefix| prefix.eq_ignore_ascii_case("custom:"))
            .map_or(trimmed, |_| trimmed[7..].trim());
        if hex.starts_with('#')
            && let Some(rgb) = Rgb::from_hex(hex)
        {
            return Self::Custom(rgb);
        }
        Self::Unrecognized(trimmed.to_string())
    }

    /// Label used in artifact file names.
    pub fn label(&self) -> String {
        match self {
            Self::Original => "Original".to_string(),
            Self::Black => "Black".to_string(),
            Self::White => "White".to_string(),
            Self::Grayscale => "Grayscale".to_string(),
            Self::Inverted => "Inverted".to_string(),
            Self::Custom(rgb) => format!("Custom-{}", &rgb.to_hex()[1..]),
            Self::Unrecognized(raw) => crate::utils::sanitize_file_component(raw),
        }
    }

    /// Flat target color for the flat-replace modes.
    pub fn flat_target(&self) -> Option<Rgb> {
        match self {
            Self::Black => Some(Rgb::BLACK),
            Self::White => Some(Rgb::WHITE),
            Self::Grayscale => Some(Rgb::GRAY),
            Self::Custom(rgb) => Some(*rgb),
            Self::Original | Self::Inverted | Self::Unrecognized(_) => None,
        }
    }

    /// Whether this tag changes anything at all.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Original | Self::Unrecognized(_))
    }

    /// Pixel op on one straight-alpha RGBA pixel. Alpha is never touched.
    pub fn apply_pixel(&self, [r, g, b, a]: [u8; 4]) -> [u8; 4] {
        match self {
            Self::Black => [0, 0, 0, a],
            Self::White => [255, 255, 255, a],
            Self::Grayscale => {
                let sum = u16::from(r) + u16::from(g) + u16::from(b);
                let v = ((f64::from(sum)) / 3.0).round() as u8;
                [v, v, v, a]
            }
            Self::Inverted => [255 - r, 255 - g, 255 - b, a],
            Self::Custom(rgb) => [rgb.r, rgb.g, rgb.b, a],
            Self::Original | Self::Unrecognized(_) => [r, g, b, a],
        }
    }
}

impl From<String> for ColorTag {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ColorTag> for String {
    fn from(tag: ColorTag) -> Self {
        match tag {
            ColorTag::Custom(rgb) => format!("custom:{}", rgb.to_hex()),
            ColorTag::Unrecognized(raw) => raw,
            other => other.label(),
        }
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Rgb::from_hex("#88c0d0"), Some(Rgb::new(0x88, 0xc0, 0xd0)));
        assert_eq!(Rgb::from_hex("#fa0"), Some(Rgb::new(0xff, 0xaa, 0x00)));
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
        assert_eq!(Rgb::from_hex("#ffff"), None);
    }

    #[test]
    fn test_invert_is_involution() {
        for hex in ["#000000", "#ffffff", "#ff0000", "#123abc", "#808080"] {
            let rgb = Rgb::from_hex(hex).unwrap();
            assert_eq!(rgb.invert().invert(), rgb);
        }
        assert_eq!(Rgb::from_hex("#ff0000").unwrap().invert().to_hex(), "#00ffff");
    }

    #[test]
    fn test_parse_css_colors() {
        assert_eq!(Color::parse("red"), Some(Color::opaque(Rgb::new(255, 0, 0))));
        assert_eq!(
            Color::parse("rgb(10, 20, 30)"),
            Some(Color::opaque(Rgb::new(10, 20, 30)))
        );
        let c = Color::parse("rgba(255,0,0,0.5)").unwrap();
        assert_eq!(c.rgb, Rgb::new(255, 0, 0));
        assert_eq!(c.alpha, 0.5);
        assert_eq!(Color::parse("url(#g)"), None);
    }

    #[test]
    fn test_color_tag_parse() {
        assert_eq!(ColorTag::parse("black"), ColorTag::Black);
        assert_eq!(ColorTag::parse("Grayscale"), ColorTag::Grayscale);
        assert_eq!(
            ColorTag::parse("#FF8800"),
            ColorTag::Custom(Rgb::new(255, 136, 0))
        );
        assert_eq!(
            ColorTag::parse("custom:#ff8800"),
            ColorTag::Custom(Rgb::new(255, 136, 0))
        );
        assert_eq!(
            ColorTag::parse("sepia"),
            ColorTag::Unrecognized("sepia".to_string())
        );
    }

    #[test]
    fn test_color_tag_labels() {
        assert_eq!(ColorTag::Black.label(), "Black");
        assert_eq!(ColorTag::Custom(Rgb::new(255, 136, 0)).label(), "Custom-ff8800");
        assert_eq!(ColorTag::Unrecognized("a/b".to_string()).label(), "a-b");
    }

    #[test]
    fn test_color_tag_serde() {
        let tags: Vec<ColorTag> = serde_json::from_str(r##"["Original","#000","custom:#0000ff"]"##).unwrap();
        assert_eq!(tags[0], ColorTag::Original);
        assert_eq!(tags[1], ColorTag::Custom(Rgb::BLACK));
        assert_eq!(
            serde_json::to_string(&tags[2]).unwrap(),
            r##""custom:#0000ff""##
        );
    }

    #[test]
    fn test_pixel_ops_preserve_alpha() {
        let px = [200, 100, 50, 77];
        for tag in [
            ColorTag::Black,
            ColorTag::White,
            ColorTag::Grayscale,
            ColorTag::Inverted,
            ColorTag::Custom(Rgb::new(1, 2, 3)),
        ] {
            assert_eq!(tag.apply_pixel(px)[3], 77, "{tag}");
        }
        assert_eq!(ColorTag::Grayscale.apply_pixel(px), [117, 117, 117, 77]);
        assert_eq!(ColorTag::Inverted.apply_pixel(px), [55, 155, 205, 77]);
        assert_eq!(ColorTag::Original.apply_pixel(px), px);
    }
}
