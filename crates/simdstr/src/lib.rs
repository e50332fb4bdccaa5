//! Byte-level string scanning primitives for text and JSON processing.
//!
//! Every primitive has a scalar reference in [`naive`] that defines its exact
//! result, and one or more vector tiers in [`simd`] that must agree with it
//! byte for byte on every input:
//!
//! - [`memcmpeq`](naive::memcmpeq): equality of two equal-length spans
//! - [`skipspace`](naive::skipspace): length of the leading JSON whitespace run
//! - [`tolower`](naive::tolower): ASCII `A`-`Z` case fold
//! - [`compact`](naive::compact): stable removal of JSON whitespace
//! - [`qstrlen`](naive::qstrlen): content length of a `"`-quoted string
//! - [`strstr`](naive::strstr): leftmost substring search
//!
//! Tier selection is the caller's business. The tier functions can be called
//! directly (they are `unsafe` and require the matching CPU features), or
//! through a [`Scanner`], which checks availability once up front.
//!
//! ```rust
//! use simdstr::{Scanner, Tier};
//!
//! let scanner = Scanner::detect();
//! assert_eq!(scanner.qstrlen(br#""ab\"c" tail"#), Ok(4));
//! assert_eq!(scanner.strstr(b"hello", b"llo"), Some(2));
//!
//! let mut dst = [0u8; 6];
//! let n = scanner.compact(&mut dst, b"a b\tc\n");
//! assert_eq!(&dst[..n], b"abc");
//!
//! assert!(Scanner::new(Tier::Naive).is_ok());
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod dispatch;
mod error;
pub mod naive;
mod quote;
pub mod simd;

#[cfg(test)]
mod tests;

pub use dispatch::{Scanner, Tier};
pub use error::{QuoteError, UnknownTier, UnsupportedTier};
pub use quote::{QuoteScan, QuoteState};

/// Bytes treated as whitespace by [`naive::skipspace`] and
/// [`naive::compact`]: space, tab, line feed, carriage return.
pub const WHITESPACE: [u8; 4] = [b' ', b'\t', b'\n', b'\r'];
