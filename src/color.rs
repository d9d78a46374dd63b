use std::fmt;
use std::str::FromStr;

use crate::error::SceneError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 0.5, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Components as `[r, g, b, a]` for interpolation.
    pub fn to_array(&self) -> [f64; 4] {
        [self.r as f64, self.g as f64, self.b as f64, self.a as f64]
    }

    /// Build from interpolated components, clamping each to `[0, 1]`.
    pub fn from_components(c: &[f64]) -> Option<Self> {
        let get = |i: usize| c.get(i).map(|v| v.clamp(0.0, 1.0) as f32);
        Some(Self {
            r: get(0)?,
            g: get(1)?,
            b: get(2)?,
            a: get(3).unwrap_or(1.0),
        })
    }

    /// CSS `rgba()` notation, as expected by canvas-like surfaces.
    pub fn to_css(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({},{},{},{})",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`, `rgba(r,g,b,a)`
/// and a handful of named colors.
impl FromStr for Color {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        let invalid = || SceneError::InvalidColor(s.to_string());

        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }
        if let Some(body) = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))
        {
            let body = body.strip_suffix(')').ok_or_else(invalid)?;
            return parse_function(body).ok_or_else(invalid);
        }
        match input.as_str() {
            "black" => Ok(Color::BLACK),
            "white" => Ok(Color::WHITE),
            "red" => Ok(Color::RED),
            "green" => Ok(Color::GREEN),
            "blue" => Ok(Color::BLUE),
            "transparent" => Ok(Color::TRANSPARENT),
            _ => Err(invalid()),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let unit = |v: u8| v as f32 / 255.0;
    match hex.len() {
        3 => Some(Color::rgb(
            unit(digit(0)? * 17),
            unit(digit(1)? * 17),
            unit(digit(2)? * 17),
        )),
        6 => Some(Color::rgb(unit(pair(0)?), unit(pair(2)?), unit(pair(4)?))),
        8 => Some(Color::rgba(
            unit(pair(0)?),
            unit(pair(2)?),
            unit(pair(4)?),
            unit(pair(6)?),
        )),
        _ => None,
    }
}

fn parse_function(body: &str) -> Option<Color> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| -> Option<f32> {
        match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok().map(|v| v / 100.0),
            None => p.parse::<f32>().ok().map(|v| v / 255.0),
        }
    };
    let alpha = match parts.get(3) {
        Some(a) => a.parse::<f32>().ok()?,
        None => 1.0,
    };
    Some(Color::rgba(
        channel(parts[0])?.clamp(0.0, 1.0),
        channel(parts[1])?.clamp(0.0, 1.0),
        channel(parts[2])?.clamp(0.0, 1.0),
        alpha.clamp(0.0, 1.0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex(0xFF8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn test_parse_short_hex() {
        let c: Color = "#f00".parse().unwrap();
        assert_eq!(c, Color::RED);
    }

    #[test]
    fn test_parse_hex_with_alpha() {
        let c: Color = "#00000080".parse().unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rgba_function() {
        let c: Color = "rgba(255, 0, 0, 0.5)".parse().unwrap();
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.0, 0.5));
        let c: Color = "rgb(100%, 0%, 0%)".parse().unwrap();
        assert_eq!(c, Color::RED);
    }

    #[test]
    fn test_parse_named() {
        assert_eq!("White".parse::<Color>().unwrap(), Color::WHITE);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "#12".parse::<Color>(),
            Err(SceneError::InvalidColor(_))
        ));
        assert!("rgb(1,2)".parse::<Color>().is_err());
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_css_output() {
        assert_eq!(Color::rgba(1.0, 0.0, 0.0, 0.5).to_css(), "rgba(255,0,0,0.5)");
    }

    #[test]
    fn test_components_round_trip() {
        let c = Color::rgba(0.25, 0.5, 0.75, 1.0);
        assert_eq!(Color::from_components(&c.to_array()), Some(c));
        assert_eq!(Color::from_components(&[1.0]), None);
    }
}
