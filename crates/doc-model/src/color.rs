use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alpha appended to a shape's base color to produce its fill.
pub const SHAPE_FILL_ALPHA: u8 = 0x40;

/// RGBA color, written as `#rrggbb` (opaque) or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const HIGHLIGHT_YELLOW: Rgba = Rgba::rgb(0xff, 0xeb, 0x3b);
    pub const MARKUP_RED: Rgba = Rgba::rgb(0xef, 0x44, 0x44);
    pub const INK_BLUE: Rgba = Rgba::rgb(0x3b, 0x82, 0xf6);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 6 or 8 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let Some(hex) = trimmed.strip_prefix('#') else {
            return Err(ColorParseError::MissingHash(value.to_owned()));
        };
        if !hex.is_ascii() || !matches!(hex.len(), 6 | 8) {
            return Err(ColorParseError::BadLength(value.to_owned()));
        }

        let channel = |index: usize| {
            u8::from_str_radix(&hex[index..index + 2], 16)
                .map_err(|_| ColorParseError::BadDigit(value.to_owned()))
        };

        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a })
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_alpha_forms() {
        assert_eq!("#ff0000".parse::<Rgba>(), Ok(Rgba::rgb(255, 0, 0)));
        assert_eq!("#00ff0080".parse::<Rgba>(), Ok(Rgba::new(0, 255, 0, 0x80)));
        assert_eq!(" #FFFFFF ".parse::<Rgba>(), Ok(Rgba::WHITE));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(matches!("ff0000".parse::<Rgba>(), Err(ColorParseError::MissingHash(_))));
        assert!(matches!("#fff".parse::<Rgba>(), Err(ColorParseError::BadLength(_))));
        assert!(matches!("#gg0000".parse::<Rgba>(), Err(ColorParseError::BadDigit(_))));
    }

    #[test]
    fn fill_alpha_is_appended_to_hex_form() {
        let fill = Rgba::rgb(0x3b, 0x82, 0xf6).with_alpha(SHAPE_FILL_ALPHA);
        assert_eq!(fill.to_string(), "#3b82f640");
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&Rgba::MARKUP_RED).expect("serialize");
        assert_eq!(json, "\"#ef4444\"");
        let back: Rgba = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Rgba::MARKUP_RED);
    }
}
