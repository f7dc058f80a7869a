use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{class::ClassCode, error::ParseColorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 128, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const GRAY: Color = Color::new(128, 128, 128);
    pub const ORANGE: Color = Color::new(255, 165, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const PURPLE: Color = Color::new(128, 0, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend from `self` (t = 0) to `other` (t = 1). `t` is clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let named = match lowered.as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::RED),
            "green" => Some(Color::GREEN),
            "blue" => Some(Color::BLUE),
            "gray" | "grey" => Some(Color::GRAY),
            "orange" => Some(Color::ORANGE),
            "yellow" => Some(Color::YELLOW),
            "cyan" => Some(Color::CYAN),
            "magenta" => Some(Color::MAGENTA),
            "purple" => Some(Color::PURPLE),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = lowered
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| ParseColorError(s.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

const DEFAULT_PALETTE: [(ClassCode, Color); 2] = [(0, Color::BLUE), (1, Color::RED)];

/// Color of a class code under the default palette: 0 is blue, 1 is red.
/// Codes outside the palette are gray.
pub fn class_to_color(cls: ClassCode) -> Color {
    DEFAULT_PALETTE
        .iter()
        .find(|(code, _)| *code == cls)
        .map(|(_, color)| *color)
        .unwrap_or(Color::GRAY)
}

/// Class code to box color. Read-only once built, so one table can be shared by
/// every scene being rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ClassCode, Color>", into = "BTreeMap<ClassCode, Color>")]
pub struct ColorTable {
    colors: BTreeMap<ClassCode, Color>,
    fallback: Color,
}

impl ColorTable {
    pub fn new(colors: BTreeMap<ClassCode, Color>, fallback: Color) -> Self {
        Self { colors, fallback }
    }

    /// 0 is red, 1 is blue.
    pub fn inverted() -> Self {
        Self::new(
            BTreeMap::from([(0, Color::RED), (1, Color::BLUE)]),
            Color::GRAY,
        )
    }

    pub fn color_for(&self, cls: ClassCode) -> Color {
        self.colors.get(&cls).copied().unwrap_or(self.fallback)
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new(BTreeMap::from(DEFAULT_PALETTE), Color::GRAY)
    }
}

impl From<BTreeMap<ClassCode, Color>> for ColorTable {
    fn from(colors: BTreeMap<ClassCode, Color>) -> Self {
        Self::new(colors, Color::GRAY)
    }
}

impl From<ColorTable> for BTreeMap<ClassCode, Color> {
    fn from(table: ColorTable) -> Self {
        table.colors
    }
}
