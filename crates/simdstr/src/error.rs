use thiserror::Error;

use crate::Tier;

/// Why a byte span is not a well-formed quoted string.
///
/// Returned by every `qstrlen` tier. When several problems are present the
/// one reached first while scanning left to right is reported.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteError {
    /// The input is empty or its first byte is not `"`.
    #[error("quoted string must start with '\"'")]
    MissingOpenQuote,
    /// The input ends right after a `\`.
    #[error("unexpected end of input after '\\'")]
    DanglingEscape,
    /// A `\` is followed by something other than `\` or `"`.
    #[error("invalid escape sequence '\\{}'", .0.escape_ascii())]
    InvalidEscape(u8),
    /// The input ends before the closing `"`.
    #[error("unterminated quoted string")]
    Unterminated,
}

/// A [`Tier`] was requested that the running CPU (or the build) cannot
/// execute.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{tier} is not available on this machine")]
pub struct UnsupportedTier {
    /// The tier that was requested.
    pub tier: Tier,
}

/// A tier name that [`Tier::from_str`](core::str::FromStr::from_str) does not
/// recognize.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown tier name")]
pub struct UnknownTier;
