use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// RGB colour read from a profile (`#rrggbb`, `#rgb` or a basic name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConversionError::new(s, "color");
        let value = s.trim();

        if let Some(hex_digits) = value.strip_prefix('#') {
            let expanded: String = match hex_digits.len() {
                3 => hex_digits.chars().flat_map(|c| [c, c]).collect(),
                6 => hex_digits.to_string(),
                _ => return Err(err()),
            };
            let bytes = hex::decode(expanded).map_err(|_| err())?;
            return Ok(Color::rgb(bytes[0], bytes[1], bytes[2]));
        }

        let named = match value.to_ascii_lowercase().as_str() {
            "black" => Color::rgb(0, 0, 0),
            "white" => Color::rgb(255, 255, 255),
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 255, 0),
            "blue" => Color::rgb(0, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "cyan" => Color::rgb(0, 255, 255),
            "magenta" => Color::rgb(255, 0, 255),
            "orange" => Color::rgb(255, 200, 0),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            _ => return Err(err()),
        };
        Ok(named)
    }
}
