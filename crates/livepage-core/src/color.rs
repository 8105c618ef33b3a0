//! CSS color values.
//!
//! Parses the color syntaxes generated pages actually use (`#rgb`,
//! `#rrggbb`, `rgb()`, `rgba()`, named colors) and emits the canonical
//! `#rrggbb` form shown in the property panel.

use serde::{Deserialize, Serialize};

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                let a = match bytes.get(3) {
                    Some(&c) => hex_val(c)?,
                    None => 15,
                };
                Some(Self::rgba(r * 17, g * 17, b * 17, a * 17))
            }
            6 | 8 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                let a = if bytes.len() == 8 {
                    hex_val(bytes[6])? << 4 | hex_val(bytes[7])?
                } else {
                    255
                };
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Parse any supported CSS color value. Returns `None` for values this
    /// engine does not understand (gradients, `currentColor`, `var(...)`).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            return Self::from_rgb_args(args.strip_suffix(')')?);
        }
        named(&lower)
    }

    /// `rgb()` argument list, comma or space separated, optional alpha.
    fn from_rgb_args(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 || parts.len() > 4 {
            return None;
        }
        let channel = |p: &str| -> Option<u8> {
            let v = match p.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? * 2.55,
                None => p.parse::<f64>().ok()?,
            };
            Some(v.round().clamp(0.0, 255.0) as u8)
        };
        let a = match parts.get(3) {
            Some(p) => match p.strip_suffix('%') {
                Some(pct) => (pct.parse::<f64>().ok()? * 2.55).round().clamp(0.0, 255.0) as u8,
                None => (p.parse::<f64>().ok()? * 255.0).round().clamp(0.0, 255.0) as u8,
            },
            None => 255,
        };
        Some(Self::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            a,
        ))
    }

    /// Canonical lowercase `#rrggbb`. Alpha is dropped, so transparent
    /// black becomes `#000000`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn named(name: &str) -> Option<Color> {
    let rgb = |r, g, b| Some(Color::rgba(r, g, b, 255));
    match name {
        "transparent" => Some(Color::TRANSPARENT),
        "black" => rgb(0, 0, 0),
        "white" => rgb(255, 255, 255),
        "red" => rgb(255, 0, 0),
        "green" => rgb(0, 128, 0),
        "lime" => rgb(0, 255, 0),
        "blue" => rgb(0, 0, 255),
        "yellow" => rgb(255, 255, 0),
        "cyan" | "aqua" => rgb(0, 255, 255),
        "magenta" | "fuchsia" => rgb(255, 0, 255),
        "gray" | "grey" => rgb(128, 128, 128),
        "silver" => rgb(192, 192, 192),
        "maroon" => rgb(128, 0, 0),
        "olive" => rgb(128, 128, 0),
        "navy" => rgb(0, 0, 128),
        "purple" => rgb(128, 0, 128),
        "teal" => rgb(0, 128, 128),
        "orange" => rgb(255, 165, 0),
        "pink" => rgb(255, 192, 203),
        "brown" => rgb(165, 42, 42),
        "gold" => rgb(255, 215, 0),
        "indigo" => rgb(75, 0, 130),
        "violet" => rgb(238, 130, 238),
        "coral" => rgb(255, 127, 80),
        "salmon" => rgb(250, 128, 114),
        "tomato" => rgb(255, 99, 71),
        "crimson" => rgb(220, 20, 60),
        "khaki" => rgb(240, 230, 140),
        "beige" => rgb(245, 245, 220),
        "ivory" => rgb(255, 255, 240),
        "lightgray" | "lightgrey" => rgb(211, 211, 211),
        "darkgray" | "darkgrey" => rgb(169, 169, 169),
        "whitesmoke" => rgb(245, 245, 245),
        "skyblue" => rgb(135, 206, 235),
        "steelblue" => rgb(70, 130, 180),
        "royalblue" => rgb(65, 105, 225),
        "dodgerblue" => rgb(30, 144, 255),
        "slategray" | "slategrey" => rgb(112, 128, 144),
        _ => None,
    }
}
