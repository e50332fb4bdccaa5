//! 32-lane tier for x86 with AVX2. Remainders go to [`super::sse`].

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;
use core::ops::ControlFlow;

use super::{SPACE_TABLE, sse};
use crate::{QuoteError, QuoteScan, naive};

pub(crate) const LANES: usize = 32;
const ALL_LANES: u32 = u32::MAX;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load(p: *const u8) -> __m256i {
    // SAFETY: caller guarantees 32 readable bytes at `p`.
    unsafe { _mm256_loadu_si256(p.cast()) }
}

#[inline]
#[target_feature(enable = "avx2")]
#[allow(unused_unsafe)] // required before the intrinsics became safe calls
unsafe fn movemask(v: __m256i) -> u32 {
    // SAFETY: register-only intrinsic; this fn carries the target feature.
    unsafe { _mm256_movemask_epi8(v) as u32 }
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn space_lanes(v: __m256i) -> __m256i {
    // SAFETY: `SPACE_TABLE` is 16 readable bytes; the rest is register-only.
    unsafe {
        let table = _mm256_broadcastsi128_si256(_mm_loadu_si128(SPACE_TABLE.as_ptr().cast()));
        _mm256_cmpeq_epi8(_mm256_shuffle_epi8(table, v), v)
    }
}

/// 32-lane [`naive::memcmpeq`].
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
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
            movemask(_mm256_cmpeq_epi8(
                load(s1.as_ptr().add(i)),
                load(s2.as_ptr().add(i)),
            ))
        };
        if eq != ALL_LANES {
            return false;
        }
        i += LANES;
    }
    // SAFETY: AVX2 implies SSSE3.
    unsafe { sse::memcmpeq(&s1[i..], &s2[i..]) }
}

/// 32-lane [`naive::skipspace`], OR-ing one compare per whitespace byte.
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
#[must_use]
pub unsafe fn skipspace_cmpeq(src: &[u8]) -> usize {
    let mut i = 0;
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let space = _mm256_set1_epi8(b' ' as i8);
        let tab = _mm256_set1_epi8(b'\t' as i8);
        let lf = _mm256_set1_epi8(b'\n' as i8);
        let cr = _mm256_set1_epi8(b'\r' as i8);
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let ws = _mm256_or_si256(
                _mm256_or_si256(_mm256_cmpeq_epi8(v, space), _mm256_cmpeq_epi8(v, tab)),
                _mm256_or_si256(_mm256_cmpeq_epi8(v, lf), _mm256_cmpeq_epi8(v, cr)),
            );
            if movemask(ws) != ALL_LANES {
                break;
            }
            i += LANES;
        }
    }
    i + naive::skipspace(&src[i..])
}

/// 32-lane [`naive::skipspace`] using the `vpshufb` nibble table.
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
#[must_use]
pub unsafe fn skipspace_shuffle(src: &[u8]) -> usize {
    let mut i = 0;
    while i + LANES <= src.len() {
        // SAFETY: `i + LANES <= src.len()`.
        let ws = unsafe { movemask(space_lanes(load(src.as_ptr().add(i)))) };
        if ws != ALL_LANES {
            break;
        }
        i += LANES;
    }
    i + naive::skipspace(&src[i..])
}

pub use self::skipspace_shuffle as skipspace;

/// # Safety
///
/// AVX2, plus the pointer contract of [`super::tolower_scalar`].
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn tolower_raw(dst: *mut u8, src: *const u8, len: usize) {
    let mut i = 0;
    // SAFETY: loads and stores stay below `len`; each lane is read before
    // the store that covers it.
    unsafe {
        let below_a = _mm256_set1_epi8((b'A' - 1) as i8);
        let above_z = _mm256_set1_epi8((b'Z' + 1) as i8);
        let delta = _mm256_set1_epi8(0x20);
        while i + LANES <= len {
            let v = load(src.add(i));
            let upper = _mm256_and_si256(
                _mm256_cmpgt_epi8(v, below_a),
                _mm256_cmpgt_epi8(above_z, v),
            );
            let folded = _mm256_add_epi8(v, _mm256_and_si256(upper, delta));
            _mm256_storeu_si256(dst.add(i).cast(), folded);
            i += LANES;
        }
        sse::tolower_raw(dst.add(i), src.add(i), len - i);
    }
}

/// 32-lane [`naive::tolower`].
///
/// # Safety
///
/// The CPU must support AVX2.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "avx2")]
pub unsafe fn tolower(dst: &mut [u8], src: &[u8]) {
    assert!(dst.len() >= src.len(), "tolower: destination too small");
    // SAFETY: both spans hold `src.len()` bytes and are distinct borrows.
    unsafe { tolower_raw(dst.as_mut_ptr(), src.as_ptr(), src.len()) }
}

/// 32-lane [`naive::tolower_in_place`].
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn tolower_in_place(buf: &mut [u8]) {
    let p = buf.as_mut_ptr();
    // SAFETY: source and destination are the same live buffer.
    unsafe { tolower_raw(p, p, buf.len()) }
}

/// 32-lane [`naive::compact`].
///
/// # Safety
///
/// The CPU must support AVX2.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "avx2")]
pub unsafe fn compact(dst: &mut [u8], src: &[u8]) -> usize {
    assert!(dst.len() >= src.len(), "compact: destination too small");
    let (mut i, mut j) = (0, 0);
    let out = dst.as_mut_ptr();
    while i + LANES <= src.len() {
        // SAFETY: `j <= i`, so `dst` has room for a full chunk at `j`.
        unsafe {
            let v = load(src.as_ptr().add(i));
            let keep = !movemask(space_lanes(v));
            if keep == ALL_LANES {
                _mm256_storeu_si256(out.add(j).cast(), v);
                j += LANES;
            } else if keep != 0 {
                j += sse::compact_lanes(out.add(j), _mm256_castsi256_si128(v), keep & 0xFFFF);
                j += sse::compact_lanes(out.add(j), _mm256_extracti128_si256::<1>(v), keep >> 16);
            }
        }
        i += LANES;
    }
    // SAFETY: AVX2 implies SSSE3.
    j + unsafe { sse::compact(&mut dst[j..], &src[i..]) }
}

/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn qstrlen_from(
    mut scan: QuoteScan,
    src: &[u8],
    mut i: usize,
) -> Result<usize, QuoteError> {
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let quote = _mm256_set1_epi8(b'"' as i8);
        let backslash = _mm256_set1_epi8(b'\\' as i8);
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let special = movemask(_mm256_or_si256(
                _mm256_cmpeq_epi8(v, quote),
                _mm256_cmpeq_epi8(v, backslash),
            ));
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
        sse::qstrlen_from(scan, src, i)
    }
}

/// 32-lane [`naive::qstrlen`].
///
/// # Safety
///
/// The CPU must support AVX2.
///
/// # Errors
///
/// Same as [`naive::qstrlen`].
#[target_feature(enable = "avx2")]
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
/// The CPU must support AVX2. `needle` is non-empty and no longer than
/// `haystack`.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn strstr_from(haystack: &[u8], needle: &[u8], mut i: usize) -> Option<usize> {
    let last = needle.len() - 1;
    // SAFETY: both loads end at `i + last + LANES <= haystack.len()`.
    unsafe {
        let first_v = _mm256_set1_epi8(needle[0] as i8);
        let last_v = _mm256_set1_epi8(needle[last] as i8);
        while i + last + LANES <= haystack.len() {
            let head = _mm256_cmpeq_epi8(first_v, load(haystack.as_ptr().add(i)));
            let tail = _mm256_cmpeq_epi8(last_v, load(haystack.as_ptr().add(i + last)));
            let mut candidates = movemask(_mm256_and_si256(head, tail));
            while candidates != 0 {
                let at = i + candidates.trailing_zeros() as usize;
                if last < 2 || memcmpeq(&haystack[at + 1..at + last], &needle[1..last]) {
                    return Some(at);
                }
                candidates &= candidates - 1;
            }
            i += LANES;
        }
        sse::strstr_from(haystack, needle, i)
    }
}

/// 32-lane [`naive::strstr`].
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
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
