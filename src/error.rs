use thiserror::Error;

/// Convenience alias for unpacking results.
pub type Result<T> = std::result::Result<T, UnpackError>;

/// Everything that can go wrong while restoring a packed script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnpackError {
    /// The input does not start with the `eval(function(p,a,c,k,e,` template.
    #[error("invalid p.a.c.k.e.r. data: input is not packed")]
    NotPacked,

    /// The template matched but its arguments could not be read.
    #[error("could not make sense of p.a.c.k.e.r. data: {reason}")]
    ArgumentParse { reason: &'static str },

    /// The declared symbol count disagrees with the symbol table.
    #[error("malformed p.a.c.k.e.r. symtab ({declared} != {actual})")]
    SymtabMismatch { declared: usize, actual: usize },

    /// A token is not a numeral in the declared base (strict mode only).
    #[error("token `{token}` is not a valid base {base} numeral")]
    InvalidDigit { token: String, base: usize },

    /// No digit alphabet exists for this radix.
    #[error("unsupported base encoding: {0}")]
    UnsupportedRadix(usize),
}
