//! 64-lane tier for x86-64 with AVX-512F and AVX-512BW.
//!
//! Compares produce `__mmask64` bit masks directly, so no movemask step is
//! needed. Remainders go to [`super::avx2`].

// The AVX-512 intrinsics are stable from Rust 1.89, above the crate's
// declared minimum; the tier is opt-in through the `avx512` feature.
#![allow(clippy::cast_possible_wrap, clippy::incompatible_msrv)]

use core::arch::x86_64::*;
use core::ops::ControlFlow;

use super::{SPACE_TABLE, avx2, sse};
use crate::{QuoteError, QuoteScan, naive};

pub(crate) const LANES: usize = 64;

#[inline]
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn load(p: *const u8) -> __m512i {
    // SAFETY: caller guarantees 64 readable bytes at `p`.
    unsafe { _mm512_loadu_si512(p.cast()) }
}

#[inline]
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn space_lanes(v: __m512i) -> u64 {
    // SAFETY: `SPACE_TABLE` is 16 readable bytes; the rest is register-only.
    unsafe {
        let table = _mm512_broadcast_i32x4(_mm_loadu_si128(SPACE_TABLE.as_ptr().cast()));
        _mm512_cmpeq_epi8_mask(_mm512_shuffle_epi8(table, v), v)
    }
}

/// 64-lane [`naive::memcmpeq`].
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
#[target_feature(enable = "avx512f,avx512bw")]
#[must_use]
pub unsafe fn memcmpeq(s1: &[u8], s2: &[u8]) -> bool {
    if s1.len() != s2.len() {
        return false;
    }
    let len = s1.len();
    let mut i = 0;
    while i + LANES <= len {
        // SAFETY: `i + LANES <= len` for both spans.
        let eq = unsafe {
            _mm512_cmpeq_epi8_mask(load(s1.as_ptr().add(i)), load(s2.as_ptr().add(i)))
        };
        if eq != u64::MAX {
            return false;
        }
        i += LANES;
    }
    // SAFETY: AVX-512 machines have AVX2.
    unsafe { avx2::memcmpeq(&s1[i..], &s2[i..]) }
}

/// 64-lane [`naive::skipspace`], OR-ing one compare per whitespace byte.
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
#[target_feature(enable = "avx512f,avx512bw")]
#[must_use]
pub unsafe fn skipspace_cmpeq(src: &[u8]) -> usize {
    let mut i = 0;
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let space = _mm512_set1_epi8(b' ' as i8);
        let tab = _mm512_set1_epi8(b'\t' as i8);
        let lf = _mm512_set1_epi8(b'\n' as i8);
        let cr = _mm512_set1_epi8(b'\r' as i8);
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let ws = _mm512_cmpeq_epi8_mask(v, space)
                | _mm512_cmpeq_epi8_mask(v, tab)
                | _mm512_cmpeq_epi8_mask(v, lf)
                | _mm512_cmpeq_epi8_mask(v, cr);
            if ws != u64::MAX {
                break;
            }
            i += LANES;
        }
    }
    i + naive::skipspace(&src[i..])
}

/// 64-lane [`naive::skipspace`] using the `vpshufb` nibble table.
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
#[target_feature(enable = "avx512f,avx512bw")]
#[must_use]
pub unsafe fn skipspace_shuffle(src: &[u8]) -> usize {
    let mut i = 0;
    while i + LANES <= src.len() {
        // SAFETY: `i + LANES <= src.len()`.
        let ws = unsafe { space_lanes(load(src.as_ptr().add(i))) };
        if ws != u64::MAX {
            break;
        }
        i += LANES;
    }
    i + naive::skipspace(&src[i..])
}

pub use self::skipspace_shuffle as skipspace;

/// # Safety
///
/// AVX-512F/BW, plus the pointer contract of [`super::tolower_scalar`].
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn tolower_raw(dst: *mut u8, src: *const u8, len: usize) {
    let mut i = 0;
    // SAFETY: loads and stores stay below `len`; each lane is read before
    // the store that covers it.
    unsafe {
        let a = _mm512_set1_epi8(b'A' as i8);
        let z = _mm512_set1_epi8(b'Z' as i8);
        let delta = _mm512_set1_epi8(0x20);
        while i + LANES <= len {
            let v = load(src.add(i));
            let upper = _mm512_cmpge_epu8_mask(v, a) & _mm512_cmple_epu8_mask(v, z);
            _mm512_storeu_si512(dst.add(i).cast(), _mm512_mask_add_epi8(v, upper, v, delta));
            i += LANES;
        }
        avx2::tolower_raw(dst.add(i), src.add(i), len - i);
    }
}

/// 64-lane [`naive::tolower`].
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "avx512f,avx512bw")]
pub unsafe fn tolower(dst: &mut [u8], src: &[u8]) {
    assert!(dst.len() >= src.len(), "tolower: destination too small");
    // SAFETY: both spans hold `src.len()` bytes and are distinct borrows.
    unsafe { tolower_raw(dst.as_mut_ptr(), src.as_ptr(), src.len()) }
}

/// 64-lane [`naive::tolower_in_place`].
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
#[target_feature(enable = "avx512f,avx512bw")]
pub unsafe fn tolower_in_place(buf: &mut [u8]) {
    let p = buf.as_mut_ptr();
    // SAFETY: source and destination are the same live buffer.
    unsafe { tolower_raw(p, p, buf.len()) }
}

/// 64-lane [`naive::compact`].
///
/// Partially kept chunks are packed 16 lanes at a time with the SSSE3 table
/// path, so the tier does not depend on `avx512vbmi2`.
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "avx512f,avx512bw")]
#[allow(clippy::cast_possible_truncation)]
pub unsafe fn compact(dst: &mut [u8], src: &[u8]) -> usize {
    assert!(dst.len() >= src.len(), "compact: destination too small");
    let (mut i, mut j) = (0, 0);
    let out = dst.as_mut_ptr();
    while i + LANES <= src.len() {
        // SAFETY: `j <= i`, so `dst` has room for a full chunk at `j`.
        unsafe {
            let v = load(src.as_ptr().add(i));
            let keep = !space_lanes(v);
            if keep == u64::MAX {
                _mm512_storeu_si512(out.add(j).cast(), v);
                j += LANES;
            } else if keep != 0 {
                let lanes = [
                    _mm512_extracti32x4_epi32::<0>(v),
                    _mm512_extracti32x4_epi32::<1>(v),
                    _mm512_extracti32x4_epi32::<2>(v),
                    _mm512_extracti32x4_epi32::<3>(v),
                ];
                for (k, lane) in lanes.into_iter().enumerate() {
                    let bits = (keep >> (16 * k)) as u32 & 0xFFFF;
                    j += sse::compact_lanes(out.add(j), lane, bits);
                }
            }
        }
        i += LANES;
    }
    // SAFETY: AVX-512 machines have AVX2.
    j + unsafe { avx2::compact(&mut dst[j..], &src[i..]) }
}

/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn qstrlen_from(
    mut scan: QuoteScan,
    src: &[u8],
    mut i: usize,
) -> Result<usize, QuoteError> {
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let quote = _mm512_set1_epi8(b'"' as i8);
        let backslash = _mm512_set1_epi8(b'\\' as i8);
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let special = _mm512_cmpeq_epi8_mask(v, quote) | _mm512_cmpeq_epi8_mask(v, backslash);
            if special == 0 {
                scan.skip_content(LANES);
                i += LANES;
                continue;
            }
            let k = special.trailing_zeros() as usize;
            scan.skip_content(k);
            i = match scan.resolve(src, i + k) {
                ControlFlow::Continue(next) => next,
                ControlFlow::Break(done) => return done,
            };
        }
        avx2::qstrlen_from(scan, src, i)
    }
}

/// 64-lane [`naive::qstrlen`].
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
///
/// # Errors
///
/// Same as [`naive::qstrlen`].
#[target_feature(enable = "avx512f,avx512bw")]
pub unsafe fn qstrlen(src: &[u8]) -> Result<usize, QuoteError> {
    let mut scan = QuoteScan::new();
    match scan.resolve(src, 0) {
        // SAFETY: same target features.
        ControlFlow::Continue(i) => unsafe { qstrlen_from(scan, src, i) },
        ControlFlow::Break(done) => done,
    }
}

/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW. `needle` is non-empty and no
/// longer than `haystack`.
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn strstr_from(haystack: &[u8], needle: &[u8], mut i: usize) -> Option<usize> {
    let last = needle.len() - 1;
    // SAFETY: both loads end at `i + last + LANES <= haystack.len()`.
    unsafe {
        let first_v = _mm512_set1_epi8(needle[0] as i8);
        let last_v = _mm512_set1_epi8(needle[last] as i8);
        while i + last + LANES <= haystack.len() {
            let mut candidates = _mm512_cmpeq_epi8_mask(first_v, load(haystack.as_ptr().add(i)))
                & _mm512_cmpeq_epi8_mask(last_v, load(haystack.as_ptr().add(i + last)));
            while candidates != 0 {
                let at = i + candidates.trailing_zeros() as usize;
                if last < 2 || memcmpeq(&haystack[at + 1..at + last], &needle[1..last]) {
                    return Some(at);
                }
                candidates &= candidates - 1;
            }
            i += LANES;
        }
        avx2::strstr_from(haystack, needle, i)
    }
}

/// 64-lane [`naive::strstr`].
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512BW.
#[target_feature(enable = "avx512f,avx512bw")]
#[must_use]
pub unsafe fn strstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    // SAFETY: same target features.
    unsafe { strstr_from(haystack, needle, 0) }
}
