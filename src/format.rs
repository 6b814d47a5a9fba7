//! Sample format tags and byte widths

use crate::error::BridgeError;
use std::fmt;
use std::str::FromStr;

/// Sample format word as reported by the driver layer.
///
/// A newtype over the driver's raw format bits. The set of formats this
/// crate knows is closed, but the word itself can carry values outside it,
/// so width lookup stays total rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleFormat(u32);

impl SampleFormat {
    /// 8-bit signed integer samples
    pub const SINT8: SampleFormat = SampleFormat(0x1);
    /// 16-bit signed integer samples
    pub const SINT16: SampleFormat = SampleFormat(0x2);
    /// 24-bit signed integer samples, carried in a 4-byte slot
    pub const SINT24: SampleFormat = SampleFormat(0x4);
    /// 32-bit signed integer samples
    pub const SINT32: SampleFormat = SampleFormat(0x8);
    /// 32-bit float samples
    pub const FLOAT32: SampleFormat = SampleFormat(0x10);
    /// 64-bit float samples
    pub const FLOAT64: SampleFormat = SampleFormat(0x20);

    /// Wrap a raw driver format word
    pub const fn from_bits(bits: u32) -> Self {
        SampleFormat(bits)
    }

    /// The raw format word
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Byte width of one sample slot.
    ///
    /// Unrecognized format words fall back to a 1-byte width instead of
    /// failing. Packed 24-bit samples occupy a 4-byte slot.
    pub const fn width(self) -> usize {
        match self.0 {
            0x1 => 1,
            0x2 => 2,
            0x4 | 0x8 | 0x10 => 4,
            0x20 => 8,
            _ => 1,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            SampleFormat::SINT8 => "sint8",
            SampleFormat::SINT16 => "sint16",
            SampleFormat::SINT24 => "sint24",
            SampleFormat::SINT32 => "sint32",
            SampleFormat::FLOAT32 => "float32",
            SampleFormat::FLOAT64 => "float64",
            SampleFormat(bits) => return write!(f, "unknown(0x{:x})", bits),
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SampleFormat {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sint8" => Ok(SampleFormat::SINT8),
            "sint16" => Ok(SampleFormat::SINT16),
            "sint24" => Ok(SampleFormat::SINT24),
            "sint32" => Ok(SampleFormat::SINT32),
            "float32" => Ok(SampleFormat::FLOAT32),
            "float64" => Ok(SampleFormat::FLOAT64),
            other => Err(BridgeError::config(format!(
                "unknown sample format '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(SampleFormat::SINT8.width(), 1);
        assert_eq!(SampleFormat::SINT16.width(), 2);
        assert_eq!(SampleFormat::SINT24.width(), 4);
        assert_eq!(SampleFormat::SINT32.width(), 4);
        assert_eq!(SampleFormat::FLOAT32.width(), 4);
        assert_eq!(SampleFormat::FLOAT64.width(), 8);
    }

    #[test]
    fn test_unknown_width_defaults_to_one_byte() {
        assert_eq!(SampleFormat::from_bits(0x4000).width(), 1);
        assert_eq!(SampleFormat::from_bits(0).width(), 1);
    }

    #[test]
    fn test_parse_round_trip() {
        for format in [
            SampleFormat::SINT8,
            SampleFormat::SINT16,
            SampleFormat::SINT24,
            SampleFormat::SINT32,
            SampleFormat::FLOAT32,
            SampleFormat::FLOAT64,
        ] {
            assert_eq!(format.to_string().parse::<SampleFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_name() {
        assert!("pcm48".parse::<SampleFormat>().is_err());
    }
}
