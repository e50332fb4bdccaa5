//! 16-lane tier for x86 with SSSE3.
//!
//! SSE2 covers the compares and movemasks; SSSE3 adds the `pshufb` used by
//! the table-driven whitespace test and by compaction.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;
use core::{ops::ControlFlow, ptr};

use super::{COMPACT_LUT, SPACE_TABLE, tolower_scalar};
use crate::{QuoteError, QuoteScan, naive};

pub(crate) const LANES: usize = 16;
const ALL_LANES: u32 = 0xFFFF;

#[inline]
#[target_feature(enable = "ssse3")]
unsafe fn load(p: *const u8) -> __m128i {
    // SAFETY: caller guarantees 16 readable bytes at `p`.
    unsafe { _mm_loadu_si128(p.cast()) }
}

#[inline]
#[target_feature(enable = "ssse3")]
#[allow(unused_unsafe)] // required before the intrinsics became safe calls
unsafe fn movemask(v: __m128i) -> u32 {
    // SAFETY: register-only intrinsic; this fn carries the target feature.
    unsafe { _mm_movemask_epi8(v) as u32 }
}

/// Lanes of `v` holding a whitespace byte, via the nibble lookup table.
#[inline]
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn space_lanes(v: __m128i) -> __m128i {
    // SAFETY: `SPACE_TABLE` is 16 readable bytes; the rest is register-only.
    unsafe {
        let table = _mm_loadu_si128(SPACE_TABLE.as_ptr().cast());
        _mm_cmpeq_epi8(_mm_shuffle_epi8(table, v), v)
    }
}

/// Write the lanes of `v` selected by the 16-bit `keep` mask to `dst`, in
/// order, and return how many were written. Nothing past that is touched.
///
/// # Safety
///
/// `dst` must be writable for `keep.count_ones()` bytes.
#[inline]
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn compact_lanes(dst: *mut u8, v: __m128i, keep: u32) -> usize {
    let lo = (keep & 0xFF) as usize;
    let hi = ((keep >> 8) & 0xFF) as usize;
    let n_lo = lo.count_ones() as usize;
    let n_hi = hi.count_ones() as usize;
    let mut tmp = [0u8; LANES];
    // SAFETY: table rows are 8 bytes, `tmp` is 16, `dst` holds n_lo + n_hi.
    unsafe {
        let idx_lo = _mm_loadl_epi64(COMPACT_LUT[lo].as_ptr().cast());
        let idx_hi = _mm_loadl_epi64(COMPACT_LUT[hi].as_ptr().cast());

        _mm_storeu_si128(tmp.as_mut_ptr().cast(), _mm_shuffle_epi8(v, idx_lo));
        ptr::copy_nonoverlapping(tmp.as_ptr(), dst, n_lo);

        let upper = _mm_srli_si128::<8>(v);
        _mm_storeu_si128(tmp.as_mut_ptr().cast(), _mm_shuffle_epi8(upper, idx_hi));
        ptr::copy_nonoverlapping(tmp.as_ptr(), dst.add(n_lo), n_hi);
    }
    n_lo + n_hi
}

/// 16-lane [`naive::memcmpeq`].
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
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
            let v1 = load(s1.as_ptr().add(i));
            let v2 = load(s2.as_ptr().add(i));
            movemask(_mm_cmpeq_epi8(v1, v2))
        };
        if eq != ALL_LANES {
            return false;
        }
        i += LANES;
    }
    naive::memcmpeq(&s1[i..], &s2[i..])
}

/// 16-lane [`naive::skipspace`], OR-ing one compare per whitespace byte.
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
#[must_use]
pub unsafe fn skipspace_cmpeq(src: &[u8]) -> usize {
    let mut i = 0;
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let space = _mm_set1_epi8(b' ' as i8);
        let tab = _mm_set1_epi8(b'\t' as i8);
        let lf = _mm_set1_epi8(b'\n' as i8);
        let cr = _mm_set1_epi8(b'\r' as i8);
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let ws = _mm_or_si128(
                _mm_or_si128(_mm_cmpeq_epi8(v, space), _mm_cmpeq_epi8(v, tab)),
                _mm_or_si128(_mm_cmpeq_epi8(v, lf), _mm_cmpeq_epi8(v, cr)),
            );
            if movemask(ws) != ALL_LANES {
                break;
            }
            i += LANES;
        }
    }
    i + naive::skipspace(&src[i..])
}

/// 16-lane [`naive::skipspace`] using the `pshufb` nibble table.
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
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

/// Case fold `len` bytes from `src` to `dst`.
///
/// # Safety
///
/// SSSE3, plus the pointer contract of [`tolower_scalar`].
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn tolower_raw(dst: *mut u8, src: *const u8, len: usize) {
    let mut i = 0;
    // SAFETY: loads and stores stay below `len`; each lane is read before
    // the store that covers it, so `dst == src` is fine.
    unsafe {
        let below_a = _mm_set1_epi8((b'A' - 1) as i8);
        let above_z = _mm_set1_epi8((b'Z' + 1) as i8);
        let delta = _mm_set1_epi8(0x20);
        while i + LANES <= len {
            let v = load(src.add(i));
            // Signed compares: bytes >= 0x80 are negative and never in range.
            let upper = _mm_and_si128(_mm_cmpgt_epi8(v, below_a), _mm_cmplt_epi8(v, above_z));
            let folded = _mm_add_epi8(v, _mm_and_si128(upper, delta));
            _mm_storeu_si128(dst.add(i).cast(), folded);
            i += LANES;
        }
        tolower_scalar(dst.add(i), src.add(i), len - i);
    }
}

/// 16-lane [`naive::tolower`].
///
/// # Safety
///
/// The CPU must support SSSE3.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "ssse3")]
pub unsafe fn tolower(dst: &mut [u8], src: &[u8]) {
    assert!(dst.len() >= src.len(), "tolower: destination too small");
    // SAFETY: both spans hold `src.len()` bytes and are distinct borrows.
    unsafe { tolower_raw(dst.as_mut_ptr(), src.as_ptr(), src.len()) }
}

/// 16-lane [`naive::tolower_in_place`].
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
pub unsafe fn tolower_in_place(buf: &mut [u8]) {
    let p = buf.as_mut_ptr();
    // SAFETY: source and destination are the same live buffer.
    unsafe { tolower_raw(p, p, buf.len()) }
}

/// 16-lane [`naive::compact`].
///
/// # Safety
///
/// The CPU must support SSSE3.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "ssse3")]
pub unsafe fn compact(dst: &mut [u8], src: &[u8]) -> usize {
    assert!(dst.len() >= src.len(), "compact: destination too small");
    let (mut i, mut j) = (0, 0);
    let out = dst.as_mut_ptr();
    while i + LANES <= src.len() {
        // SAFETY: `j <= i`, so `dst` has room for a full chunk at `j`.
        unsafe {
            let v = load(src.as_ptr().add(i));
            let keep = !movemask(space_lanes(v)) & ALL_LANES;
            if keep == ALL_LANES {
                _mm_storeu_si128(out.add(j).cast(), v);
                j += LANES;
            } else if keep != 0 {
                j += compact_lanes(out.add(j), v, keep);
            }
        }
        i += LANES;
    }
    j + naive::compact(&mut dst[j..], &src[i..])
}

/// Continue a quoted-string scan that is in the content state at `i`.
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn qstrlen_from(
    mut scan: QuoteScan,
    src: &[u8],
    mut i: usize,
) -> Result<usize, QuoteError> {
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let quote = _mm_set1_epi8(b'"' as i8);
        let backslash = _mm_set1_epi8(b'\\' as i8);
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let special =
                movemask(_mm_or_si128(_mm_cmpeq_epi8(v, quote), _mm_cmpeq_epi8(v, backslash)));
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
    }
    scan.run(src, i)
}

/// 16-lane [`naive::qstrlen`].
///
/// # Safety
///
/// The CPU must support SSSE3.
///
/// # Errors
///
/// Same as [`naive::qstrlen`].
#[target_feature(enable = "ssse3")]
pub unsafe fn qstrlen(src: &[u8]) -> Result<usize, QuoteError> {
    let mut scan = QuoteScan::new();
    match scan.resolve(src, 0) {
        // SAFETY: same target features.
        ControlFlow::Continue(i) => unsafe { qstrlen_from(scan, src, i) },
        ControlFlow::Break(done) => done,
    }
}

/// Search `haystack` for `needle` from candidate start `i` on. The needle is
/// non-empty and no longer than the haystack.
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
pub(crate) unsafe fn strstr_from(haystack: &[u8], needle: &[u8], mut i: usize) -> Option<usize> {
    let last = needle.len() - 1;
    // SAFETY: both loads end at `i + last + LANES <= haystack.len()`.
    unsafe {
        let first_v = _mm_set1_epi8(needle[0] as i8);
        let last_v = _mm_set1_epi8(needle[last] as i8);
        while i + last + LANES <= haystack.len() {
            let head = _mm_cmpeq_epi8(first_v, load(haystack.as_ptr().add(i)));
            let tail = _mm_cmpeq_epi8(last_v, load(haystack.as_ptr().add(i + last)));
            let mut candidates = movemask(_mm_and_si128(head, tail));
            while candidates != 0 {
                let at = i + candidates.trailing_zeros() as usize;
                if last < 2 || memcmpeq(&haystack[at + 1..at + last], &needle[1..last]) {
                    return Some(at);
                }
                candidates &= candidates - 1;
            }
            i += LANES;
        }
    }
    naive::strstr(&haystack[i..], needle).map(|at| at + i)
}

/// 16-lane [`naive::strstr`].
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
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
