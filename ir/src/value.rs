//! Runtime values carried on channels and held as recurrent proc state.
//!
//! Values are plain data: equality, ordering, and display only. Arithmetic
//! and bit-manipulation semantics belong to whatever evaluates a proc's
//! computation, not to the network layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Widest bit vector representable by [`Bits`].
pub const MAX_BIT_WIDTH: u32 = 64;

/// Error constructing a [`Bits`] value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitsError {
    /// Requested width exceeds [`MAX_BIT_WIDTH`].
    #[error("bit width {width} exceeds the maximum of {MAX_BIT_WIDTH}")]
    WidthTooLarge {
        /// The requested width.
        width: u32,
    },
    /// Value does not fit in the requested width.
    #[error("value {value:#x} does not fit in {width} bits")]
    ValueTooWide {
        /// The requested width.
        width: u32,
        /// The value that did not fit.
        value: u64,
    },
}

/// Fixed-width bit vector, at most [`MAX_BIT_WIDTH`] bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bits {
    width: u32,
    bits: u64,
}

impl Bits {
    /// Create a bit vector, rejecting values that do not fit in `width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitsError`] when `width` exceeds [`MAX_BIT_WIDTH`] or the
    /// value has bits set above `width`.
    pub fn new(width: u32, bits: u64) -> Result<Self, BitsError> {
        if width > MAX_BIT_WIDTH {
            return Err(BitsError::WidthTooLarge { width });
        }
        if bits & !Self::mask(width) != 0 {
            return Err(BitsError::ValueTooWide { width, value: bits });
        }
        Ok(Self { width, bits })
    }

    /// Create a bit vector, truncating the value to `width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BitsError::WidthTooLarge`] when `width` exceeds
    /// [`MAX_BIT_WIDTH`].
    pub fn masked(width: u32, bits: u64) -> Result<Self, BitsError> {
        if width > MAX_BIT_WIDTH {
            return Err(BitsError::WidthTooLarge { width });
        }
        Ok(Self {
            width,
            bits: bits & Self::mask(width),
        })
    }

    /// The all-zero bit vector of the given width (clamped to the maximum).
    #[must_use]
    pub fn zero(width: u32) -> Self {
        Self {
            width: width.min(MAX_BIT_WIDTH),
            bits: 0,
        }
    }

    /// Width in bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The raw value, zero-extended to 64 bits.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.bits
    }

    fn mask(width: u32) -> u64 {
        if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bits[{}]:{}", self.width, self.bits)
    }
}

/// Runtime value: the element type of channels and recurrent state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Pure sequencing token; carries no data.
    Token,
    /// Fixed-width bit vector.
    Bits(Bits),
    /// Heterogeneous tuple.
    Tuple(Vec<Value>),
    /// Homogeneous array.
    Array(Vec<Value>),
}

impl Value {
    /// Shorthand for an unsigned bit-vector value, truncated to `width`.
    ///
    /// # Errors
    ///
    /// Returns [`BitsError::WidthTooLarge`] when `width` exceeds
    /// [`MAX_BIT_WIDTH`].
    pub fn ubits(width: u32, value: u64) -> Result<Self, BitsError> {
        Ok(Self::Bits(Bits::masked(width, value)?))
    }

    /// A 32-bit value, the common element type in tests and examples.
    #[must_use]
    pub fn u32(value: u32) -> Self {
        Self::Bits(Bits {
            width: 32,
            bits: u64::from(value),
        })
    }

    /// The bit vector inside, if this is a [`Value::Bits`].
    #[must_use]
    pub fn as_bits(&self) -> Option<&Bits> {
        match self {
            Self::Bits(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Bits(b) => write!(f, "{b}"),
            Self::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Self::Array(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_masking() {
        let b = Bits::masked(8, 0x1ff).unwrap();
        assert_eq!(b.as_u64(), 0xff);
        assert_eq!(b.width(), 8);
    }

    #[test]
    fn test_bits_rejects_oversize_width() {
        assert!(matches!(
            Bits::new(65, 0),
            Err(BitsError::WidthTooLarge { width: 65 })
        ));
    }

    #[test]
    fn test_bits_rejects_value_too_wide() {
        assert!(matches!(
            Bits::new(4, 16),
            Err(BitsError::ValueTooWide { width: 4, .. })
        ));
        assert!(Bits::new(4, 15).is_ok());
    }

    #[test]
    fn test_full_width_mask() {
        let b = Bits::masked(64, u64::MAX).unwrap();
        assert_eq!(b.as_u64(), u64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::u32(42).to_string(), "bits[32]:42");
        assert_eq!(
            Value::Tuple(vec![Value::Token, Value::u32(1)]).to_string(),
            "(token, bits[32]:1)"
        );
    }
}
