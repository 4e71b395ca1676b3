//! CSS color parsing and the luminance/contrast math used to grade popup
//! legibility. Accepts the notations that appear in style catalogs: `#RRGGBB`,
//! `#RGB`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.

use std::fmt;

/// Contrast reported when one side of the pair has zero luminance. Larger than
/// any ratio two non-black colors can reach (`#000001` on white is ~3532).
pub const MAX_CONTRAST_RATIO: f64 = 10_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Weighted sum of the normalized channels. No gamma linearization is
    /// applied, so pure black is the only color with zero luminance.
    pub fn luminance(&self) -> f64 {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("empty color value")]
    Empty,
    #[error("invalid hex color: {0}")]
    InvalidHex(String),
    #[error("invalid functional color: {0}")]
    InvalidFunctional(String),
    #[error("unsupported color notation: {0}")]
    Unsupported(String),
}

pub fn parse_color(input: &str) -> Result<Rgb, ColorParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ColorParseError::Empty);
    }

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ColorParseError::InvalidHex(trimmed.to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(args) = functional_args(&lower, "rgba") {
        return parse_channels(args, 4)
            .ok_or_else(|| ColorParseError::InvalidFunctional(trimmed.to_string()));
    }
    if let Some(args) = functional_args(&lower, "rgb") {
        return parse_channels(args, 3)
            .ok_or_else(|| ColorParseError::InvalidFunctional(trimmed.to_string()));
    }

    Err(ColorParseError::Unsupported(trimmed.to_string()))
}

/// Ratio of the brighter luminance to the darker one. Symmetric in its
/// arguments and always finite and at least 1.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    luminance_ratio(a.luminance(), b.luminance())
}

pub(crate) fn luminance_ratio(first: f64, second: f64) -> f64 {
    let (hi, lo) = if first >= second {
        (first, second)
    } else {
        (second, first)
    };

    if hi == lo {
        return 1.0;
    }
    if lo <= 0.0 {
        tracing::debug!(hi, "zero luminance in contrast pair, clamping ratio");
        return MAX_CONTRAST_RATIO;
    }

    hi / lo
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        3 => {
            let mut channels = hex
                .chars()
                .map(|ch| ch.to_digit(16).map(|digit| (digit * 17) as u8));
            let r = channels.next()??;
            let g = channels.next()??;
            let b = channels.next()??;
            Some(Rgb::new(r, g, b))
        }
        _ => None,
    }
}

fn functional_args<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_channels(args: &str, expected: usize) -> Option<Rgb> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != expected {
        return None;
    }

    let r = parse_channel(parts[0])?;
    let g = parse_channel(parts[1])?;
    let b = parse_channel(parts[2])?;

    if expected == 4 {
        let alpha: f64 = parts[3].parse().ok()?;
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }
    }

    Some(Rgb::new(r, g, b))
}

fn parse_channel(value: &str) -> Option<u8> {
    value.parse::<u8>().ok()
}
