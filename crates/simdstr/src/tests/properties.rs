//! Algebraic properties of the primitives. Most run on the detected tier;
//! the search properties run on every available one.

use bstr::BStr;

use super::{
    arbitrary::{Bytes, Padded, Search, quote},
    quickcheck, scanners,
};
use crate::{QuoteError, Scanner, naive};

fn lower(scanner: Scanner, src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    scanner.tolower(&mut dst, src);
    dst
}

fn packed(scanner: Scanner, src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    let n = scanner.compact(&mut dst, src);
    dst.truncate(n);
    dst
}

#[test]
fn tolower_is_idempotent() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Bytes) -> bool {
        let scanner = Scanner::detect();
        let once = lower(scanner, &input.0);
        lower(scanner, &once) == once
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

#[test]
fn tolower_only_touches_upper_case() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Bytes) -> bool {
        let out = lower(Scanner::detect(), &input.0);
        input.0.iter().zip(&out).all(|(&s, &d)| {
            if s.is_ascii_uppercase() {
                d == s.to_ascii_lowercase()
            } else {
                d == s
            }
        })
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

#[test]
fn compact_is_idempotent() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Bytes) -> bool {
        let scanner = Scanner::detect();
        let once = packed(scanner, &input.0);
        packed(scanner, &once) == once
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

#[test]
fn compact_keeps_non_space_in_order() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Bytes) -> bool {
        let expected: Vec<u8> = input
            .0
            .iter()
            .copied()
            .filter(|&b| !naive::is_space(b))
            .collect();
        packed(Scanner::detect(), &input.0) == expected
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

#[test]
fn skipspace_stops_at_first_non_space() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Padded) -> bool {
        let n = Scanner::detect().skipspace(&input.0);
        input.0[..n].iter().all(|&b| naive::is_space(b))
            && input.0.get(n).is_none_or(|&b| !naive::is_space(b))
    }
    quickcheck().quickcheck(prop as fn(Padded) -> bool);
}

#[test]
fn qstrlen_of_quoted_content() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(content: Bytes, tail: Bytes) -> bool {
        let mut src = quote(&content.0);
        src.extend_from_slice(&tail.0);
        Scanner::detect().qstrlen(&src) == Ok(content.0.len())
    }
    quickcheck().quickcheck(prop as fn(Bytes, Bytes) -> bool);
}

#[test]
fn qstrlen_of_truncated_string_fails() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(content: Bytes) -> bool {
        let mut src = quote(&content.0);
        src.pop();
        let err = Scanner::detect().qstrlen(&src);
        matches!(err, Err(QuoteError::Unterminated | QuoteError::DanglingEscape))
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

/// First offset where `needle` starts, by brute force.
fn leftmost(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    (0..=haystack.len().checked_sub(needle.len())?).find(|&i| haystack[i..].starts_with(needle))
}

#[test]
fn strstr_finds_inserted_needle() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(prefix: Bytes, needle: Bytes, suffix: Bytes) {
        let mut haystack = prefix.0.clone();
        haystack.extend_from_slice(&needle.0);
        haystack.extend_from_slice(&suffix.0);
        let expected = leftmost(&haystack, &needle.0);
        assert!(expected.is_some_and(|at| at <= prefix.0.len()));
        assert_eq!(naive::strstr(&haystack, &needle.0), expected);
        for scanner in scanners() {
            assert_eq!(
                scanner.strstr(&haystack, &needle.0),
                expected,
                "{} searching {:?} in {:?}",
                scanner.tier(),
                BStr::new(&needle.0),
                BStr::new(&haystack)
            );
        }
    }
    quickcheck().quickcheck(prop as fn(Bytes, Bytes, Bytes));
}

#[test]
fn strstr_is_leftmost() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Search) {
        let expected = leftmost(&input.haystack, &input.needle);
        assert_eq!(naive::strstr(&input.haystack, &input.needle), expected);
        for scanner in scanners() {
            assert_eq!(
                scanner.strstr(&input.haystack, &input.needle),
                expected,
                "{} searching {:?} in {:?}",
                scanner.tier(),
                BStr::new(&input.needle),
                BStr::new(&input.haystack)
            );
        }
    }
    quickcheck().quickcheck(prop as fn(Search));
}

#[test]
fn strstr_empty_and_oversized_needles() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Bytes) -> bool {
        let mut longer = input.0.clone();
        longer.push(b'!');
        scanners().into_iter().all(|scanner| {
            scanner.strstr(&input.0, b"") == Some(0) && scanner.strstr(&input.0, &longer).is_none()
        })
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

#[test]
fn memcmpeq_is_reflexive() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(input: Bytes) -> bool {
        let copy = input.0.clone();
        scanners().into_iter().all(|scanner| scanner.memcmpeq(&input.0, &copy))
    }
    quickcheck().quickcheck(prop as fn(Bytes) -> bool);
}

#[test]
fn worked_examples() {
    for scanner in scanners() {
        assert_eq!(scanner.qstrlen(br#""abc""#), Ok(3));
        assert_eq!(scanner.qstrlen(br#""ab\"c""#), Ok(4));
        assert_eq!(scanner.qstrlen(br#""\x""#), Err(QuoteError::InvalidEscape(b'x')));
        assert_eq!(scanner.strstr(b"hello", b"world"), None);

        let mut dst = [0u8; 6];
        assert_eq!(scanner.compact(&mut dst, b"a b\tc\n"), 3);
        assert_eq!(&dst[..3], b"abc");

        assert_eq!(lower(scanner, b"Hello!"), b"hello!");
    }
}

#[test]
#[should_panic(expected = "destination too small")]
fn compact_rejects_short_destination() {
    let mut dst = [0u8; 2];
    let _ = Scanner::detect().compact(&mut dst, b"abc");
}

#[test]
#[should_panic(expected = "destination too small")]
fn tolower_rejects_short_destination() {
    let mut dst = [0u8; 40];
    Scanner::detect().tolower(&mut dst, &[b'A'; 41]);
}
