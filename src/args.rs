use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, UnpackError};

/// Radix assumed when the packer writes `[]` instead of a number.
pub const DEFAULT_RADIX: usize = 62;

/// The four arguments handed to the packed unpacking function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedInvocation {
    /// The compressed code, still holding encoded placeholder words.
    pub payload: String,
    /// Base of the placeholder words. `1` means they are plain decimal indices.
    pub radix: usize,
    /// Symbol count the invocation claims.
    pub declared_count: usize,
    /// Replacement words in decode index order. Empty entries are kept.
    pub symbol_table: Vec<String>,
}

/// Extracts the P.A.C.K.E.R. arguments from the source code.
///
/// Two shapes are recognised:
/// 1. Full pattern with extra parameters: `}('payload', radix, count, 'symbols'.split('|'), extra, params))`
/// 2. Simple pattern: `}('payload', radix, count, 'symbols'.split('|')`
///
/// Arguments never span lines, and the first invocation in the text is the
/// one read.
///
/// Only the shape is checked here. Whether `declared_count` agrees with
/// the symbol table is left to the caller.
///
/// # Errors
///
/// Returns [`UnpackError::ArgumentParse`] if neither pattern matches or the
/// radix or count does not fit in a `usize`.
///
/// # Examples
///
/// ```rust
/// let args = packer_decode::extract_arguments("}('0 1',[],2,'a||b'.split('|'),0,{}))").unwrap();
/// assert_eq!(args.payload, "0 1");
/// assert_eq!(args.radix, 62);
/// assert_eq!(args.declared_count, 2);
/// assert_eq!(args.symbol_table, ["a", "", "b"]);
/// ```
pub fn extract_arguments(source: &str) -> Result<PackedInvocation> {
    static JUICERS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
        [
            Regex::new(
                r"\}\('(.*)',\s*(\d+|\[\]),\s*(\d+),\s*'(.*)'\.split\('\|'\),\s*(\d+),\s*(.*)\)\)",
            )
            .unwrap(),
            Regex::new(r"\}\('(.*)',\s*(\d+|\[\]),\s*(\d+),\s*'(.*)'\.split\('\|'\)").unwrap(),
        ]
    });

    // earliest invocation wins, the full pattern on a tie
    let caps = JUICERS
        .iter()
        .filter_map(|juicer| juicer.captures(source))
        .min_by_key(|caps| caps.get(0).map_or(usize::MAX, |m| m.start()))
        .ok_or(UnpackError::ArgumentParse {
            reason: "unexpected code structure",
        })?;

    let radix = match &caps[2] {
        "[]" => DEFAULT_RADIX,
        radix => radix.parse().map_err(|_| UnpackError::ArgumentParse {
            reason: "radix out of range",
        })?,
    };
    let declared_count = caps[3].parse().map_err(|_| UnpackError::ArgumentParse {
        reason: "count out of range",
    })?;

    Ok(PackedInvocation {
        payload: caps[1].to_owned(),
        radix,
        declared_count,
        symbol_table: caps[4].split('|').map(String::from).collect(),
    })
}
