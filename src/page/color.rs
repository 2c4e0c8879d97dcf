//! CSS color and background paint parsing
//!
//! Supports the subset the theme catalog and page snapshots use: hex colors
//! (3, 4, 6 and 8 digits), `rgb()`/`rgba()`, a handful of named colors,
//! `transparent`, and `linear-gradient(...)` backgrounds.

use regex::Regex;
use std::sync::OnceLock;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color value.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(caps) = rgb_function_regex().captures(value) {
            let channel = |i: usize| -> Option<u8> {
                let v: f32 = caps.get(i)?.as_str().parse().ok()?;
                Some(v.clamp(0.0, 255.0).round() as u8)
            };
            let alpha = match caps.get(4) {
                Some(a) => {
                    let a = a.as_str();
                    let v: f32 = match a.strip_suffix('%') {
                        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                        None => a.parse().ok()?,
                    };
                    (v.clamp(0.0, 1.0) * 255.0).round() as u8
                }
                None => 255,
            };
            return Some(Color::rgba(channel(1)?, channel(2)?, channel(3)?, alpha));
        }
        match value.to_ascii_lowercase().as_str() {
            "transparent" => Some(Color::TRANSPARENT),
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            "gold" => Some(Color::rgb(255, 215, 0)),
            "crimson" => Some(Color::rgb(220, 20, 60)),
            _ => None,
        }
    }

    /// Whether the color is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Multiply the alpha channel by an opacity factor.
    pub fn with_opacity(self, opacity: f32) -> Color {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Color { a, ..self }
    }

    /// Source-over composite of `self` onto `dst`.
    pub fn over(self, dst: Color) -> Color {
        let sa = self.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let blend = |s: u8, d: u8| {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Color::rgba(
            blend(self.r, dst.r),
            blend(self.g, dst.g),
            blend(self.b, dst.b),
            (out_a * 255.0).round() as u8,
        )
    }

    /// Convert into an `image` pixel.
    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    /// `#rrggbb` (alpha dropped).
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn rgb_function_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^rgba?\(\s*([\d.]+)\s*[, ]\s*([\d.]+)\s*[, ]\s*([\d.]+)\s*(?:[,/]\s*([\d.]+%?)\s*)?\)$",
        )
        .unwrap_or_else(|_| unreachable!("static color regex is valid"))
    })
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Extract `(r, g, b)` from a 6-digit hex color, the form used for `--theme-primary-rgb`.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }
    parse_hex(digits).map(|c| (c.r, c.g, c.b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Background Paint
// ─────────────────────────────────────────────────────────────────────────────

/// A color stop along a gradient line, `position` in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Color,
    pub position: f32,
}

/// A resolved background paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    LinearGradient { angle_deg: f32, stops: Vec<ColorStop> },
}

impl Paint {
    /// Parse a `background`/`background-color` value.
    pub fn parse(value: &str) -> Option<Paint> {
        let value = value.trim();
        if let Some(inner) = value
            .strip_prefix("linear-gradient(")
            .and_then(|v| v.strip_suffix(')'))
        {
            return parse_linear_gradient(inner);
        }
        Color::parse(value).map(Paint::Solid)
    }

    /// Color at a point inside a `width` x `height` box.
    pub fn color_at(&self, x: f32, y: f32, width: f32, height: f32) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::LinearGradient { angle_deg, stops } => {
                let angle = angle_deg.to_radians();
                let (sin, cos) = angle.sin_cos();
                let line = (width * sin).abs() + (height * cos).abs();
                let t = if line > 0.0 {
                    ((x - width / 2.0) * sin - (y - height / 2.0) * cos) / line + 0.5
                } else {
                    0.0
                };
                sample_stops(stops, t.clamp(0.0, 1.0))
            }
        }
    }
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Color {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Color::TRANSPARENT,
    };
    if t <= first.position {
        return first.color;
    }
    if t >= last.position {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.position && t <= b.position {
            let span = (b.position - a.position).max(f32::EPSILON);
            let f = (t - a.position) / span;
            let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f).round() as u8;
            return Color::rgba(
                mix(a.color.r, b.color.r),
                mix(a.color.g, b.color.g),
                mix(a.color.b, b.color.b),
                mix(a.color.a, b.color.a),
            );
        }
    }
    last.color
}

/// Split on `separator` where it is not nested inside parentheses.
pub fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

fn parse_linear_gradient(inner: &str) -> Option<Paint> {
    let mut parts = split_top_level(inner, ',').into_iter().peekable();
    let mut angle_deg = 180.0;
    if let Some(first) = parts.peek() {
        if let Some(deg) = first.strip_suffix("deg") {
            angle_deg = deg.trim().parse().ok()?;
            parts.next();
        } else if let Some(direction) = first.strip_prefix("to ") {
            angle_deg = match direction.trim() {
                "top" => 0.0,
                "right" => 90.0,
                "bottom" => 180.0,
                "left" => 270.0,
                "bottom right" | "right bottom" => 135.0,
                "top right" | "right top" => 45.0,
                "bottom left" | "left bottom" => 225.0,
                "top left" | "left top" => 315.0,
                _ => return None,
            };
            parts.next();
        }
    }

    let mut raw: Vec<(Color, Option<f32>)> = Vec::new();
    for part in parts {
        // The color may itself contain spaces (`rgba(0, 0, 0, 1)`), so the
        // position is whatever follows the last top-level space.
        let tokens = split_top_level(part, ' ');
        let (color_text, position) = match tokens.last() {
            Some(last) if tokens.len() > 1 && last.ends_with('%') => {
                let pct: f32 = last.trim_end_matches('%').parse().ok()?;
                (part[..part.len() - last.len()].trim(), Some(pct / 100.0))
            }
            _ => (part, None),
        };
        raw.push((Color::parse(color_text)?, position));
    }
    if raw.is_empty() {
        return None;
    }

    let count = raw.len();
    let stops = raw
        .into_iter()
        .enumerate()
        .map(|(i, (color, position))| ColorStop {
            color,
            position: position.unwrap_or(if count == 1 {
                0.0
            } else {
                i as f32 / (count - 1) as f32
            }),
        })
        .collect();
    Some(Paint::LinearGradient { angle_deg, stops })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Color::parse("#dc143c"), Some(Color::rgb(220, 20, 60)));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#dc143c20"), Some(Color::rgba(220, 20, 60, 0x20)));
        assert_eq!(Color::parse("#zzzzzz"), None);
    }

    #[test]
    fn test_parse_rgba_function() {
        assert_eq!(
            Color::parse("rgba(220, 20, 60, 0.15)"),
            Some(Color::rgba(220, 20, 60, 38))
        );
        assert_eq!(Color::parse("rgb(1,2,3)"), Some(Color::rgb(1, 2, 3)));
    }

    #[test]
    fn test_over_compositing() {
        assert_eq!(Color::TRANSPARENT.over(Color::WHITE), Color::WHITE);
        assert_eq!(Color::BLACK.over(Color::WHITE), Color::BLACK);
        let half = Color::rgba(0, 0, 0, 128).over(Color::WHITE);
        assert!(half.is_opaque());
        assert!((126..=128).contains(&half.r));
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#00a86b"), Some((0, 168, 107)));
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("linear-gradient(red, blue)"), None);
    }

    #[test]
    fn test_parse_theme_gradient() {
        let paint = Paint::parse("linear-gradient(135deg, #0a0a0a 0%, #1a0000 100%)").unwrap();
        match &paint {
            Paint::LinearGradient { angle_deg, stops } => {
                assert_eq!(*angle_deg, 135.0);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[1].position, 1.0);
            }
            _ => panic!("expected gradient"),
        }
        // Top-left corner is the start, bottom-right the end
        assert_eq!(paint.color_at(0.0, 0.0, 100.0, 100.0), Color::rgb(10, 10, 10));
        assert_eq!(paint.color_at(100.0, 100.0, 100.0, 100.0), Color::rgb(26, 0, 0));
    }

    #[test]
    fn test_gradient_with_rgba_stops() {
        let paint = Paint::parse("linear-gradient(to right, rgba(0, 0, 0, 1), white)").unwrap();
        assert_eq!(paint.color_at(0.0, 5.0, 10.0, 10.0), Color::BLACK);
        assert_eq!(paint.color_at(10.0, 5.0, 10.0, 10.0), Color::WHITE);
    }

    #[test]
    fn test_split_top_level_respects_parens() {
        let parts = split_top_level("rgba(1, 2, 3, 1) 0%, #fff 100%", ',');
        assert_eq!(parts, vec!["rgba(1, 2, 3, 1) 0%", "#fff 100%"]);
    }
}
