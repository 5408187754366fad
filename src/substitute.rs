use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::{Result, UnpackError},
    unbaser::{DecodeError, Unbaser},
};

/// Turns placeholder words into symbol table indices.
#[derive(Debug, Clone)]
pub enum TokenDecoder {
    /// Radix 1: words are decimal indices already.
    Decimal,
    /// Any other radix: words are numerals in that base.
    Positional(Unbaser),
}

impl TokenDecoder {
    /// Picks the decoding strategy for a packed radix.
    ///
    /// # Errors
    ///
    /// Returns [`UnpackError::UnsupportedRadix`] when no alphabet exists for
    /// `radix`.
    pub fn for_radix(radix: usize) -> Result<Self> {
        match radix {
            1 => Ok(Self::Decimal),
            _ => Unbaser::new(radix).map(Self::Positional),
        }
    }

    /// Decodes one word to a symbol table index.
    ///
    /// # Errors
    ///
    /// [`DecodeError::InvalidDigit`] when the word is not a numeral in the
    /// radix, [`DecodeError::Overflow`] when it does not fit in a `usize`.
    pub fn index(&self, word: &str) -> std::result::Result<usize, DecodeError> {
        match self {
            Self::Decimal => {
                if !word.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(DecodeError::InvalidDigit { base: 1 });
                }
                word.parse().map_err(|_| DecodeError::Overflow)
            }
            Self::Positional(unbaser) => unbaser.unbase(word),
        }
    }
}

/// Decodes placeholder words in the payload using the symbol table.
///
/// Every maximal run of ASCII word characters (`[0-9A-Za-z_]`) is decoded to
/// an index and replaced by `symtab[index]`. A word stays as written when the
/// index is past the end of the table, the entry is empty, the numeral
/// overflows, or (unless `strict`) it is not a numeral in the radix at all.
/// Everything between words is copied through untouched. Replacements are
/// never rescanned.
///
/// # Errors
///
/// With `strict` set, the first word that is not a numeral in the radix
/// fails with [`UnpackError::InvalidDigit`].
///
/// # Examples
///
/// ```rust
/// use packer_decode::{substitute, TokenDecoder};
///
/// let symtab = ["x".to_string(), "y".to_string()];
/// let decoder = TokenDecoder::for_radix(10).unwrap();
/// assert_eq!(substitute("0+1*99", &symtab, &decoder, false).unwrap(), "x+y*99");
/// ```
pub fn substitute(
    payload: &str,
    symtab: &[String],
    decoder: &TokenDecoder,
    strict: bool,
) -> Result<String> {
    static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9A-Za-z_]+").unwrap());

    let mut output = String::with_capacity(payload.len());
    let mut last = 0;

    for word in WORD_REGEX.find_iter(payload) {
        output.push_str(&payload[last..word.start()]);
        last = word.end();

        let text = word.as_str();
        let index = match decoder.index(text) {
            Ok(index) => index,
            Err(DecodeError::InvalidDigit { base }) if strict => {
                return Err(UnpackError::InvalidDigit {
                    token: text.to_owned(),
                    base,
                });
            }
            Err(_) => {
                output.push_str(text);
                continue;
            }
        };

        match symtab.get(index) {
            Some(symbol) if !symbol.is_empty() => output.push_str(symbol),
            _ => output.push_str(text),
        }
    }

    output.push_str(&payload[last..]);
    Ok(output)
}
