//! A utility for unpacking P.A.C.K.E.R. encoded JavaScript code.
//!
//! This unpacker **restores** the original code from P.A.C.K.E.R. compressed/obfuscated JavaScript
//! without evaluating any of it: the invocation is parsed, placeholder words are decoded
//! from their radix and swapped for the matching symbol table entry.
//!
//! ## Typical P.A.C.K.E.R. Structure
//! ```javascript
//! eval(function(p,a,c,k,e,d){
//!   // Unpacking logic
//! }('payload', radix, count, 'symbol|table'.split('|'), 0, {}))
//! ```
//!
//! # Examples
//!
//! ```rust
//! let packed_code = r#"eval(function(p,a,c,k,e,r){...}('0 2=1',62,3,'var||a'.split('|'),0,{}))"#;
//!
//! // Unpack to original JavaScript
//! let original = packer_decode::unpack(packed_code).unwrap();
//! assert_eq!(original, "var a=1");
//! ```
//!
//! Every call is a pure function of its input, so the same [`Unpacker`] can be
//! shared freely between threads.

use std::sync::LazyLock;

use regex::Regex;

pub use crate::{
    args::{DEFAULT_RADIX, PackedInvocation, extract_arguments},
    error::{Result, UnpackError},
    substitute::{TokenDecoder, substitute},
    unbaser::{DecodeError, Unbaser},
};

mod args;
mod error;
mod strings;
mod substitute;
mod unbaser;

static PACKED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^eval\s*\(\s*function\s*\(\s*p\s*,\s*a\s*,\s*c\s*,\s*k\s*,\s*e\s*,\s*\w+\s*\)",
    )
    .unwrap()
});

/// Detects whether the input string is P.A.C.K.E.R. encoded JavaScript.
///
/// Leading whitespace is ignored; the text must then open with the
/// `eval(function(p,a,c,k,e,d)` template. Spaces between the template's
/// tokens are tolerated and the last parameter may have any name.
///
/// # Examples
///
/// ```rust
/// assert!(packer_decode::detect("eval(function(p,a,c,k,e,r){...}"));
/// assert!(!packer_decode::detect("var x = 1;"));
/// assert!(!packer_decode::detect(""));
/// ```
#[inline]
pub fn detect(source: &str) -> bool {
    PACKED_REGEX.is_match(source.trim_start())
}

/// Unpacks P.A.C.K.E.R. encoded JavaScript with the default [`Unpacker`].
///
/// # Errors
///
/// See [`Unpacker::unpack`].
///
/// # Examples
///
/// ```rust
/// let packed = "eval(function(p,a,c,k,e,r){...}('0 2=1',62,3,'var||a'.split('|'),0,{}))";
/// let unpacked = packer_decode::unpack(packed).unwrap();
/// assert_eq!(unpacked, "var a=1");
/// ```
#[inline]
pub fn unpack(source: &str) -> Result<String> {
    Unpacker::default().unpack(source)
}

/// Unpacking options.
///
/// The default leaves undecodable words in place, keeps payload escapes as
/// written and does no post-processing.
///
/// ```rust
/// use packer_decode::{UnpackError, Unpacker};
///
/// let packed = "eval(function(p,a,c,k,e,d){}('0 zz',10,1,'a'.split('|'),0,{}))";
/// assert_eq!(Unpacker::new().unpack(packed).unwrap(), "a zz");
/// assert!(matches!(
///     Unpacker::new().strict(true).unpack(packed),
///     Err(UnpackError::InvalidDigit { .. })
/// ));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unpacker {
    strict: bool,
    unescape_payload: bool,
    resolve_string_arrays: bool,
}

impl Unpacker {
    /// Options with every switch off, the same as [`Unpacker::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`UnpackError::InvalidDigit`] instead of keeping words that
    /// are not numerals in the declared radix.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Fold the `\\` and `\'` string escapes of the payload before decoding.
    pub fn unescape_payload(mut self, unescape: bool) -> Self {
        self.unescape_payload = unescape;
        self
    }

    /// Inline `var _name=["..."];` string arrays after decoding.
    pub fn resolve_string_arrays(mut self, resolve: bool) -> Self {
        self.resolve_string_arrays = resolve;
        self
    }

    /// Unpacks P.A.C.K.E.R. encoded JavaScript code back to its original form.
    ///
    /// Nothing is returned on failure: either the whole payload is decoded
    /// or an error explains why it could not be.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input is not P.A.C.K.E.R. encoded ([`UnpackError::NotPacked`])
    /// - The invocation arguments are malformed ([`UnpackError::ArgumentParse`])
    /// - The symbol table count doesn't match the actual symbols ([`UnpackError::SymtabMismatch`])
    /// - The radix has no digit alphabet ([`UnpackError::UnsupportedRadix`])
    /// - A word is not a numeral in the radix and strict mode is on ([`UnpackError::InvalidDigit`])
    pub fn unpack(&self, source: &str) -> Result<String> {
        self.try_unpack(source).inspect_err(|err| {
            tracing::debug!(%err, strict = self.strict, "p.a.c.k.e.r. unpack failed");
        })
    }

    fn try_unpack(&self, source: &str) -> Result<String> {
        if !detect(source) {
            return Err(UnpackError::NotPacked);
        }

        let invocation = extract_arguments(source)?;
        let session = Session::new(&invocation)?;

        let payload = if self.unescape_payload {
            invocation.payload.replace(r"\\", r"\").replace(r"\'", "'")
        } else {
            invocation.payload.clone()
        };

        let decoded = session.run(&payload, self.strict)?;
        if self.resolve_string_arrays {
            Ok(strings::resolve_string_arrays(&decoded))
        } else {
            Ok(decoded)
        }
    }
}

/// Decoder and symbol table for one unpack call.
struct Session<'a> {
    decoder: TokenDecoder,
    symtab: &'a [String],
}

impl<'a> Session<'a> {
    fn new(invocation: &'a PackedInvocation) -> Result<Self> {
        let actual = invocation.symbol_table.len();
        if invocation.declared_count != actual {
            return Err(UnpackError::SymtabMismatch {
                declared: invocation.declared_count,
                actual,
            });
        }

        Ok(Self {
            decoder: TokenDecoder::for_radix(invocation.radix)?,
            symtab: &invocation.symbol_table,
        })
    }

    fn run(&self, payload: &str, strict: bool) -> Result<String> {
        substitute(payload, self.symtab, &self.decoder, strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(payload: &str, radix: &str, count: usize, symbols: &str) -> String {
        format!(
            "eval(function(p,a,c,k,e,d){{e=function(c){{return c}};return p}}('{}',{},{},'{}'.split('|'),0,{{}}))",
            payload, radix, count, symbols
        )
    }

    #[test]
    fn test_detect() {
        fn positive(input: &str) {
            assert!(detect(input), "Should detect P.A.C.K.E.R. in: {}", input);
        }

        fn negative(input: &str) {
            assert!(
                !detect(input),
                "Should NOT detect P.A.C.K.E.R. in: {}",
                input
            );
        }

        negative("");
        negative("   ");
        negative("var a = b");
        negative("console.log(1)");
        negative("eval(function(p,a,c,k,e");
        negative("eval(function(a,b,c,d,e,f){}");
        negative("x; eval(function(p,a,c,k,e,d){}");

        positive("eval(function(p,a,c,k,e,d){");
        positive("eval(function(p,a,c,k,e,r){...}");
        positive("eval ( function(p, a, c, k, e, r ) {");
        positive("\n\t  eval(function(p,a,c,k,e,d){");
    }

    #[test]
    fn test_unpack() {
        fn check(input: &str, expected: &str) {
            let result = unpack(input).unwrap();
            assert_eq!(result, expected, "Unpacking failed for input");
        }

        check(&packed("0.1.2", "62", 3, "alpha|beta|gamma"), "alpha.beta.gamma");
        check(&packed("0 1 0", "1", 2, "x|y"), "x y x");
        check(&packed("0 99", "10", 2, "first|second"), "first 99");
        check(&packed("0 2=1", "[]", 3, "var||a"), "var a=1");
    }

    #[test]
    fn test_errors() {
        assert_eq!(unpack("console.log(1)").unwrap_err(), UnpackError::NotPacked);
        assert_eq!(
            unpack(&packed("0 1 2 3 4", "10", 5, "a|b|c|d")).unwrap_err(),
            UnpackError::SymtabMismatch {
                declared: 5,
                actual: 4
            }
        );
        assert_eq!(
            unpack(&packed("0", "70", 1, "a")).unwrap_err(),
            UnpackError::UnsupportedRadix(70)
        );
        assert!(matches!(
            unpack("eval(function(p,a,c,k,e,d){return p}(\"0\",10,1,\"a\"))"),
            Err(UnpackError::ArgumentParse { .. })
        ));
    }

    #[test]
    fn test_logs_failures_only() {
        use std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        };

        use tracing::{Event, Metadata, Subscriber, span};

        struct CountEvents(Arc<AtomicUsize>);

        impl Subscriber for CountEvents {
            fn enabled(&self, _: &Metadata<'_>) -> bool {
                true
            }
            fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
                span::Id::from_u64(1)
            }
            fn record(&self, _: &span::Id, _: &span::Record<'_>) {}
            fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}
            fn event(&self, _: &Event<'_>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn enter(&self, _: &span::Id) {}
            fn exit(&self, _: &span::Id) {}
        }

        let events = Arc::new(AtomicUsize::new(0));
        tracing::subscriber::with_default(CountEvents(events.clone()), || {
            // undecodable and out-of-range words are kept silently
            let source = packed("0 zz 99 _x", "10", 1, "a");
            assert_eq!(unpack(&source).unwrap(), "a zz 99 _x");
            assert_eq!(events.load(Ordering::SeqCst), 0);

            assert!(unpack("console.log(1)").is_err());
            assert_eq!(events.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn test_options() {
        let source = packed(r"0 1=\'2\'", "10", 3, "var|s|hi");
        assert_eq!(unpack(&source).unwrap(), r"var s=\'hi\'");
        assert_eq!(
            Unpacker::new()
                .unescape_payload(true)
                .unpack(&source)
                .unwrap(),
            "var s='hi'"
        );

        let source = packed(r#"0 _a=["2","3"];4(_a[1])"#, "10", 5, "var|1|hello|world|alert");
        assert_eq!(
            Unpacker::new()
                .resolve_string_arrays(true)
                .unpack(&source)
                .unwrap(),
            r#"alert("world")"#
        );
    }
}
