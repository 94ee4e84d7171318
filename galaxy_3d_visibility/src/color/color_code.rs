/// Color codes
///
/// GPU-renderable instance identifiers.
///
/// Each probe instance is drawn with a flat, unlit color. Reading the
/// pixels back and mapping colors to fragments tells which instances
/// survived depth testing.

use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};

/// An (r, g, b) triple identifying one probe instance.
///
/// `0-0-0` is reserved for the background (cleared) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ColorCode {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorCode {
    /// Clear color of the probe target; never assigned to an instance.
    pub const BACKGROUND: ColorCode = ColorCode { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from the first three bytes of an RGBA pixel (alpha ignored).
    pub fn from_rgba(pixel: &[u8]) -> Option<Self> {
        match pixel {
            [r, g, b, ..] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    /// Dense index of this code: b varies fastest, then g, then r.
    pub const fn index(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Inverse of `index()`. Returns None above the 24-bit range.
    pub const fn from_index(index: u32) -> Option<Self> {
        if index > 0x00FF_FFFF {
            return None;
        }
        Some(Self::new((index >> 16) as u8, (index >> 8) as u8, index as u8))
    }

    pub const fn is_background(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Canonical "r-g-b" key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Normalized RGBA as written into the instance color attribute.
    ///
    /// The probe target stores UNORM8 so `round(c * 255)` gives back the
    /// exact channel value.
    pub fn to_unorm(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.r, self.g, self.b)
    }
}

impl FromStr for ColorCode {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        let mut parts = key.split('-');
        let mut channel = || -> Result<u8> {
            parts
                .next()
                .and_then(|part| part.parse::<u8>().ok())
                .ok_or_else(|| Error::InvalidResource(format!("Malformed color key '{}'", key)))
        };
        let (r, g, b) = (channel()?, channel()?, channel()?);
        if parts.next().is_some() {
            return Err(Error::InvalidResource(format!("Malformed color key '{}'", key)));
        }
        Ok(Self::new(r, g, b))
    }
}

/// Enumerates color codes in a fixed order without reuse.
///
/// Produces `0-0-1`, `0-0-2`, ..., `0-0-255`, `0-1-0`, ... up to
/// `255-255-255`, then refuses further codes instead of wrapping.
#[derive(Debug, Clone)]
pub struct ColorCounter {
    next_index: u32,
}

impl ColorCounter {
    /// Number of usable codes (background excluded).
    pub const CAPACITY: u32 = 0x00FF_FFFF;

    pub fn new() -> Self {
        Self { next_index: 1 }
    }

    /// Next unused code, or None once the space is exhausted.
    pub fn next_code(&mut self) -> Option<ColorCode> {
        let code = ColorCode::from_index(self.next_index)?;
        self.next_index += 1;
        Some(code)
    }

    /// Number of codes handed out so far.
    pub fn issued(&self) -> u32 {
        self.next_index - 1
    }

    pub fn remaining(&self) -> u32 {
        Self::CAPACITY - self.issued()
    }

    /// Skip ahead so that `issued() == issued` (tests only).
    #[cfg(test)]
    pub(crate) fn skip_to(&mut self, issued: u32) {
        self.next_index = issued + 1;
    }
}

impl Default for ColorCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "color_code_tests.rs"]
mod tests;
