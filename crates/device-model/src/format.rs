//! Pixel formats and captured-frame descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

const fn fourcc(code: &[u8; 4]) -> u32 {
    ((code[0] as u32) << 24) | ((code[1] as u32) << 16) | ((code[2] as u32) << 8) | code[3] as u32
}

/// Driver-level pixel format code of a detected signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    /// No format (no signal, or the device has no signal monitor).
    pub const UNKNOWN: PixelFormat = PixelFormat(0);
    pub const YUV_8BIT: PixelFormat = PixelFormat(fourcc(b"2vuy"));
    pub const YUV_10BIT: PixelFormat = PixelFormat(fourcc(b"v210"));
    pub const ARGB_8BIT: PixelFormat = PixelFormat(32);
    pub const BGRA_8BIT: PixelFormat = PixelFormat(fourcc(b"BGRA"));
    pub const RGB_10BIT: PixelFormat = PixelFormat(fourcc(b"r210"));
    pub const RGB_12BIT: PixelFormat = PixelFormat(fourcc(b"R12B"));
    pub const RGB_12BIT_LE: PixelFormat = PixelFormat(fourcc(b"R12L"));
    pub const RGBX_10BIT_LE: PixelFormat = PixelFormat(fourcc(b"R10l"));
    pub const RGBX_10BIT: PixelFormat = PixelFormat(fourcc(b"R10b"));

    /// Raw format code.
    pub fn code(self) -> u32 {
        self.0
    }

    /// Whether this is the "no format" sentinel.
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    /// Label for well-known formats.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::YUV_8BIT => "8-bit YUV",
            Self::YUV_10BIT => "10-bit YUV",
            Self::ARGB_8BIT => "8-bit ARGB",
            Self::BGRA_8BIT => "8-bit BGRA",
            Self::RGB_10BIT => "10-bit RGB",
            Self::RGB_12BIT => "12-bit RGB",
            Self::RGB_12BIT_LE => "12-bit RGB LE",
            Self::RGBX_10BIT_LE => "10-bit RGBX LE",
            Self::RGBX_10BIT => "10-bit RGBX",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return Ok(());
        }
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Descriptor of a captured input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Monotonic frame counter of the capturing monitor.
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub row_bytes: u32,
}
