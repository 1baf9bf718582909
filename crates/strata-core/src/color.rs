//! Color values and hex <-> RGB conversion
//!
//! Colors travel through the generator in two forms: `#rrggbb` strings (the
//! palette extractor counts them, config files carry them) and `Rgb` triples
//! (the recolorer does arithmetic on them). Conversions between the two are
//! lossless for valid input.

use crate::error::{Result, StrataError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit per channel RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Format as lowercase `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Shift each channel by a signed amount, saturating at 0 and 255
    pub fn shifted(&self, dr: i32, dg: i32, db: i32) -> Self {
        Self {
            r: saturate(i32::from(self.r) + dr),
            g: saturate(i32::from(self.g) + dg),
            b: saturate(i32::from(self.b) + db),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn saturate(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// A single channel intensity handed to [`rgb_to_hex`].
///
/// Integers are absolute intensities, floats are fractions of full
/// intensity. Both are clamped rather than rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Channel {
    Int(i64),
    Float(f64),
}

impl Channel {
    /// Clamp into an 8-bit intensity
    pub fn to_u8(self) -> u8 {
        match self {
            Channel::Int(v) => v.clamp(0, 255) as u8,
            Channel::Float(v) if v.is_nan() || v < 0.0 => 0,
            Channel::Float(v) if v > 1.0 => 255,
            // ties go to the even intensity: 0.3 -> 76.5 -> 76
            Channel::Float(v) => (v * 255.0).round_ties_even() as u8,
        }
    }
}

impl From<u8> for Channel {
    fn from(v: u8) -> Self {
        Channel::Int(i64::from(v))
    }
}

impl From<i32> for Channel {
    fn from(v: i32) -> Self {
        Channel::Int(i64::from(v))
    }
}

impl From<i64> for Channel {
    fn from(v: i64) -> Self {
        Channel::Int(v)
    }
}

impl From<f32> for Channel {
    fn from(v: f32) -> Self {
        Channel::Float(f64::from(v))
    }
}

impl From<f64> for Channel {
    fn from(v: f64) -> Self {
        Channel::Float(v)
    }
}

impl TryFrom<&toml::Value> for Channel {
    type Error = StrataError;

    fn try_from(value: &toml::Value) -> Result<Self> {
        match value {
            toml::Value::Integer(i) => Ok(Channel::Int(*i)),
            toml::Value::Float(f) => Ok(Channel::Float(*f)),
            other => Err(StrataError::ColorType(format!(
                "{} ({})",
                other,
                other.type_str()
            ))),
        }
    }
}

/// Convert a hex color to its RGB triple.
///
/// Accepts `#rrggbb` or `rrggbb` in either case.
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StrataError::ColorFormat(hex.to_string()));
    }

    let parse = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| StrataError::ColorFormat(hex.to_string()))
    };

    Ok(Rgb {
        r: parse(0..2)?,
        g: parse(2..4)?,
        b: parse(4..6)?,
    })
}

/// Convert three channel intensities to a lowercase `#rrggbb` string,
/// clamping each channel first.
pub fn rgb_to_hex(r: impl Into<Channel>, g: impl Into<Channel>, b: impl Into<Channel>) -> String {
    Rgb {
        r: r.into().to_u8(),
        g: g.into().to_u8(),
        b: b.into().to_u8(),
    }
    .to_hex()
}

/// Draw a uniformly random `#rrggbb` color
pub fn random_hex_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let r: u8 = rng.gen_range(0..=255);
    let g: u8 = rng.gen_range(0..=255);
    let b: u8 = rng.gen_range(0..=255);
    Rgb::new(r, g, b).to_hex()
}
