//! Scalar reference primitives.
//!
//! These are deliberately plain byte-at-a-time loops. They define the result
//! every vector tier in [`crate::simd`] must reproduce.

use crate::{QuoteError, QuoteScan};

/// Whether `b` is one of the four JSON whitespace bytes.
#[inline]
#[must_use]
pub const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Whether `s1` and `s2` hold the same bytes.
///
/// Spans of different length are never equal. Stops at the first mismatch.
#[must_use]
pub fn memcmpeq(s1: &[u8], s2: &[u8]) -> bool {
    if s1.len() != s2.len() {
        return false;
    }
    for (a, b) in s1.iter().zip(s2) {
        if a != b {
            return false;
        }
    }
    true
}

/// Branch-free equality: folds every byte pair into one flag without early
/// exit, a loop shape the compiler turns into vector code on any target.
#[must_use]
pub fn memcmpeq_autovec(s1: &[u8], s2: &[u8]) -> bool {
    if s1.len() != s2.len() {
        return false;
    }
    let mut eq = true;
    for (a, b) in s1.iter().zip(s2) {
        eq &= a == b;
    }
    eq
}

/// Length of the leading run of whitespace in `src`.
#[must_use]
pub fn skipspace(src: &[u8]) -> usize {
    src.iter().take_while(|&&b| is_space(b)).count()
}

/// Copy `src` into the front of `dst`, folding ASCII `A`-`Z` to lower case.
///
/// Every other byte is copied unchanged, so multi-byte UTF-8 sequences pass
/// through intact.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
pub fn tolower(dst: &mut [u8], src: &[u8]) {
    assert!(dst.len() >= src.len(), "tolower: destination too small");
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = if s.is_ascii_uppercase() { s + 0x20 } else { s };
    }
}

/// [`tolower`] with source and destination being the same buffer.
pub fn tolower_in_place(buf: &mut [u8]) {
    for b in buf {
        if b.is_ascii_uppercase() {
            *b += 0x20;
        }
    }
}

/// Copy the non-whitespace bytes of `src` to the front of `dst`, keeping
/// their order, and return how many were written.
///
/// Bytes of `dst` past the returned count are left as they were.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
pub fn compact(dst: &mut [u8], src: &[u8]) -> usize {
    assert!(dst.len() >= src.len(), "compact: destination too small");
    let mut j = 0;
    for &b in src {
        if !is_space(b) {
            dst[j] = b;
            j += 1;
        }
    }
    j
}

/// Number of content bytes in the quoted string at the start of `src`.
///
/// `src` must begin with `"`. Inside the string only `\\` and `\"` are valid
/// escapes and each pair counts as one byte. Everything after the closing
/// quote is ignored.
///
/// ```rust
/// use simdstr::{QuoteError, naive::qstrlen};
///
/// assert_eq!(qstrlen(br#""abc""#), Ok(3));
/// assert_eq!(qstrlen(br#""ab\"c" trailing"#), Ok(4));
/// assert_eq!(qstrlen(br#""\x""#), Err(QuoteError::InvalidEscape(b'x')));
/// ```
///
/// # Errors
///
/// Returns a [`QuoteError`] if `src` does not start with `"`, ends inside an
/// escape or before the closing quote, or escapes anything but `\` and `"`.
pub fn qstrlen(src: &[u8]) -> Result<usize, QuoteError> {
    QuoteScan::new().run(src, 0)
}

/// Offset of the leftmost occurrence of `needle` in `haystack`.
///
/// An empty needle matches at offset 0, even in an empty haystack.
#[must_use]
pub fn strstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let Some((&first, rest)) = needle.split_first() else {
        return Some(0);
    };
    if needle.len() > haystack.len() {
        return None;
    }
    for i in 0..=haystack.len() - needle.len() {
        if haystack[i] != first {
            continue;
        }
        if rest
            .iter()
            .zip(&haystack[i + 1..])
            .all(|(a, b)| a == b)
        {
            return Some(i);
        }
    }
    None
}
