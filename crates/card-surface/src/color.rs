//! RGBA colours and their textual forms

use crate::{Result, SurfaceError};
use std::fmt;
use std::str::FromStr;

/// RGBA colour (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("brown", Color::rgb(165, 42, 42)),
    ("transparent", Color::rgba(0, 0, 0, 0)),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Channels scaled to 0.0 - 1.0 (for PDF operators)
    pub fn unit_rgb(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a colour
    ///
    /// Accepted forms:
    /// - `#RRGGBB`, `#RRGGBBAA`, `0xRRGGBB`, `0xRRGGBBAA`
    /// - a colour name (`red`, `white`, `transparent`, ...)
    /// - decimal components `r,g,b` or `r,g,b,a`
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let invalid = || SurfaceError::InvalidColor(s.to_string());

        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"));
        if let Some(hex) = hex {
            return parse_hex(hex).ok_or_else(invalid);
        }

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 && parts.len() != 4 {
                return Err(invalid());
            }
            let mut channels = [255u8; 4];
            for (slot, part) in channels.iter_mut().zip(&parts) {
                *slot = part.parse::<u8>().map_err(|_| invalid())?;
            }
            return Ok(Self::rgba(channels[0], channels[1], channels[2], channels[3]));
        }

        let lower = s.to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or_else(invalid)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl FromStr for Color {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#FF8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::parse("0x00ff0080").unwrap(), Color::rgba(0, 255, 0, 128));
        assert!(Color::parse("#FFF").is_err());
        assert!(Color::parse("#GG0000").is_err());
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(Color::parse("Red").unwrap(), Color::rgb(255, 0, 0));
        assert!(Color::parse("transparent").unwrap().is_transparent());
        assert!(Color::parse("ultraviolet").is_err());
    }

    #[test]
    fn test_parse_components() {
        assert_eq!(Color::parse("10, 20, 30").unwrap(), Color::rgb(10, 20, 30));
        assert_eq!(Color::parse("1,2,3,4").unwrap(), Color::rgba(1, 2, 3, 4));
        assert!(Color::parse("1,2").is_err());
        assert!(Color::parse("1,2,300").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(c.to_string(), "#01020304");
        assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
        assert_eq!(Color::white().to_string(), "#FFFFFF");
    }

    #[test]
    fn test_unit_rgb() {
        assert_eq!(Color::white().unit_rgb(), (1.0, 1.0, 1.0));
        assert_eq!(Color::black().unit_rgb(), (0.0, 0.0, 0.0));
    }
}
