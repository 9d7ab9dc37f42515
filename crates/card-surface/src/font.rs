//! Font specifications

use crate::{Result, SurfaceError};
use std::fmt;
use std::str::FromStr;

/// A font request: family, size in points and style flags
///
/// The textual form is `family;size;bold;underline;italic;strikeout` where the
/// flags are `1`/`0` (or `true`/`false`). Trailing flags may be omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub underline: bool,
    pub italic: bool,
    pub strikeout: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("Arial", 12.0)
    }
}

impl FontSpec {
    pub fn new(family: &str, size: f32) -> Self {
        Self {
            family: family.to_string(),
            size,
            bold: false,
            underline: false,
            italic: false,
            strikeout: false,
        }
    }

    /// Parse `family;size;bold;underline;italic;strikeout`
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split(';').map(str::trim).collect();
        let invalid = || SurfaceError::InvalidFont(input.to_string());

        let family = parts.first().filter(|f| !f.is_empty()).ok_or_else(invalid)?;
        let size = match parts.get(1) {
            Some(s) => s
                .replace(',', ".")
                .parse::<f32>()
                .ok()
                .filter(|v| *v > 0.0)
                .ok_or_else(invalid)?,
            None => 12.0,
        };

        let flag = |i: usize| -> Result<bool> {
            match parts.get(i).map(|s| s.to_ascii_lowercase()) {
                None => Ok(false),
                Some(s) => match s.as_str() {
                    "" | "0" | "false" => Ok(false),
                    "1" | "true" => Ok(true),
                    _ => Err(invalid()),
                },
            }
        };

        Ok(Self {
            family: family.to_string(),
            size,
            bold: flag(2)?,
            underline: flag(3)?,
            italic: flag(4)?,
            strikeout: flag(5)?,
        })
    }

    /// Same font at a different size
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

impl FromStr for FontSpec {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        FontSpec::parse(s)
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b: bool| if b { 1 } else { 0 };
        write!(
            f,
            "{};{};{};{};{};{}",
            self.family,
            self.size,
            flag(self.bold),
            flag(self.underline),
            flag(self.italic),
            flag(self.strikeout)
        )
    }
}
