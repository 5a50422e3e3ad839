//! Colour values for caption styling.
//!
//! Config files carry colours as strings (`"white"`, `"#FFFF00"`,
//! `"0xFFFF00"`). They are parsed once at load time and rendered in the
//! `&HAABBGGRR` notation the subtitle renderer expects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Render as a subtitle colour with the given opacity in `[0, 1]`.
    ///
    /// Alpha is inverted in this notation: `00` is opaque, `FF` is fully
    /// transparent, and channels are stored blue-green-red.
    pub fn to_ass(self, opacity: f64) -> String {
        let alpha = ((1.0 - opacity.clamp(0.0, 1.0)) * 255.0).round() as u8;
        format!("&H{alpha:02X}{:02X}{:02X}{:02X}", self.b, self.g, self.r)
    }

    fn named(name: &str) -> Option<Self> {
        let rgb = match name {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "red" => Self::new(0xFF, 0x00, 0x00),
            "green" => Self::new(0x00, 0x80, 0x00),
            "lime" => Self::new(0x00, 0xFF, 0x00),
            "blue" => Self::new(0x00, 0x00, 0xFF),
            "yellow" => Self::new(0xFF, 0xFF, 0x00),
            "cyan" => Self::new(0x00, 0xFF, 0xFF),
            "magenta" => Self::new(0xFF, 0x00, 0xFF),
            "orange" => Self::new(0xFF, 0xA5, 0x00),
            "gray" | "grey" => Self::new(0x80, 0x80, 0x80),
            _ => return None,
        };
        Some(rgb)
    }
}

/// Error returned when a colour string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour '{0}': expected a name, #RRGGBB or 0xRRGGBB")]
pub struct ParseColorError(String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if let Some(rgb) = Self::named(&lower) {
            return Ok(rgb);
        }

        let hex = lower
            .strip_prefix('#')
            .or_else(|| lower.strip_prefix("0x"))
            .ok_or_else(|| ParseColorError(trimmed.to_string()))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError(trimmed.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(trimmed.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!("white".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("Black".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!(
            "0xFFFF00".parse::<Rgb>().unwrap(),
            Rgb::new(0xFF, 0xFF, 0x00)
        );
        assert_eq!(
            "#1a2B3c".parse::<Rgb>().unwrap(),
            Rgb::new(0x1A, 0x2B, 0x3C)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("chartreuse-ish".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("0xGG0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_ass_notation_is_bgr_with_inverted_alpha() {
        assert_eq!(Rgb::WHITE.to_ass(1.0), "&H00FFFFFF");
        assert_eq!(Rgb::new(0x11, 0x22, 0x33).to_ass(1.0), "&H00332211");
        assert_eq!(Rgb::BLACK.to_ass(0.5), "&H80000000");
        assert_eq!(Rgb::BLACK.to_ass(0.0), "&HFF000000");
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&Rgb::new(0xFF, 0xFF, 0x00)).unwrap();
        assert_eq!(json, "\"#FFFF00\"");
        let parsed: Rgb = serde_json::from_str("\"yellow\"").unwrap();
        assert_eq!(parsed, Rgb::new(0xFF, 0xFF, 0x00));
        assert!(serde_json::from_str::<Rgb>("\"nope\"").is_err());
    }
}
