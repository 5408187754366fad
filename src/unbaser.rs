use std::{collections::HashMap, num::IntErrorKind};

use thiserror::Error;

use crate::error::UnpackError;

const ALPHANUMERIC: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PRINTABLE_ASCII: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Why a single token could not be turned into an index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid digit for base {base}")]
    InvalidDigit { base: usize },
    /// The numeral is valid but does not fit in a `usize`.
    #[error("numeral overflows usize")]
    Overflow,
}

/// Functor for a given base. Will convert strings to natural numbers
#[derive(Debug, Clone)]
pub struct Unbaser {
    /// The numeric base for conversion
    base: usize,
    /// Character-to-value mapping for bases > 36. None for native bases (2-36)
    dictionary: Option<HashMap<char, usize>>,
}

impl Unbaser {
    /// Creates a new `Unbaser` for the given base.
    ///
    /// # Supported bases
    ///
    /// - **2 to 36**: digits `0-9a-z`, case-insensitive, decoded with
    ///   [`usize::from_str_radix`].
    /// - **37 to 62**: the first `base` characters of `0-9a-zA-Z`. Case is
    ///   significant, so `a` is 10 and `A` is 36.
    /// - **95**: the printable ASCII characters from space to tilde.
    ///
    /// Base 1 is not a numeral base; packed scripts use it to mean the
    /// tokens are already decimal indices, which the caller handles.
    ///
    /// # Errors
    ///
    /// Returns [`UnpackError::UnsupportedRadix`] for any other base.
    pub fn new(base: usize) -> Result<Self, UnpackError> {
        let dictionary = match base {
            2..=36 => None,
            37..=62 => Some(Self::build_dict(&ALPHANUMERIC[..base])),
            95 => Some(Self::build_dict(PRINTABLE_ASCII)),
            _ => return Err(UnpackError::UnsupportedRadix(base)),
        };

        Ok(Self { base, dictionary })
    }

    fn build_dict(alphabet: &str) -> HashMap<char, usize> {
        alphabet.chars().enumerate().map(|(i, c)| (c, i)).collect()
    }

    /// Converts a string representing a number in the given base into a `usize`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidDigit`] if the input is empty or holds a
    ///   character outside the base's alphabet.
    /// - [`DecodeError::Overflow`] if the value does not fit in a `usize`.
    pub fn unbase(&self, input: &str) -> Result<usize, DecodeError> {
        let invalid = DecodeError::InvalidDigit { base: self.base };
        match &self.dictionary {
            None => {
                // from_str_radix tolerates a leading sign, a numeral does not
                if input.starts_with('+') {
                    return Err(invalid);
                }
                usize::from_str_radix(input, self.base as u32).map_err(|e| match e.kind() {
                    IntErrorKind::PosOverflow => DecodeError::Overflow,
                    _ => invalid,
                })
            }
            Some(dict) => {
                if input.is_empty() {
                    return Err(invalid);
                }
                input.chars().try_fold(0usize, |acc, ch| {
                    let digit = *dict.get(&ch).ok_or_else(|| invalid.clone())?;
                    acc.checked_mul(self.base)
                        .and_then(|shifted| shifted.checked_add(digit))
                        .ok_or(DecodeError::Overflow)
                })
            }
        }
    }
}
