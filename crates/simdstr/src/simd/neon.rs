//! 16-lane tier for aarch64 NEON.
//!
//! NEON has no movemask; whole-register tests use horizontal min/max, and the
//! places that need lane positions pack the compare result into a 16-bit mask
//! with a multiply. Remainders go straight to the scalar reference.

#![allow(clippy::cast_possible_truncation)]

use core::arch::aarch64::*;
use core::{ops::ControlFlow, ptr};

use super::{COMPACT_LUT, SPACE_TABLE, tolower_scalar};
use crate::{QuoteError, QuoteScan, naive};

pub(crate) const LANES: usize = 16;

#[inline]
#[target_feature(enable = "neon")]
unsafe fn load(p: *const u8) -> uint8x16_t {
    // SAFETY: caller guarantees 16 readable bytes at `p`.
    unsafe { vld1q_u8(p) }
}

/// Bit `k` set iff lane `k` of the compare result `v` is all-ones.
#[inline]
#[target_feature(enable = "neon")]
#[allow(unused_unsafe)] // required before the intrinsics became safe calls
unsafe fn movemask(v: uint8x16_t) -> u32 {
    const MAGIC: u64 = 0x0102_0408_1020_4080;
    // SAFETY: register-only intrinsic; this fn carries the target feature.
    unsafe {
        let bits = vreinterpretq_u64_u8(vshrq_n_u8::<7>(v));
        let lo = (vgetq_lane_u64::<0>(bits).wrapping_mul(MAGIC) >> 56) as u32;
        let hi = (vgetq_lane_u64::<1>(bits).wrapping_mul(MAGIC) >> 56) as u32;
        lo | (hi << 8)
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn space_lanes(v: uint8x16_t) -> uint8x16_t {
    // SAFETY: `SPACE_TABLE` is 16 readable bytes; the rest is register-only.
    unsafe {
        let table = vld1q_u8(SPACE_TABLE.as_ptr());
        let nibbles = vandq_u8(v, vdupq_n_u8(0x0F));
        vceqq_u8(vqtbl1q_u8(table, nibbles), v)
    }
}

#[inline]
#[target_feature(enable = "neon")]
#[allow(unused_unsafe)] // required before the intrinsics became safe calls
unsafe fn all_lanes(v: uint8x16_t) -> bool {
    // SAFETY: register-only intrinsic; this fn carries the target feature.
    unsafe { vminvq_u8(v) == 0xFF }
}

/// 16-lane [`naive::memcmpeq`].
///
/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
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
            all_lanes(vceqq_u8(load(s1.as_ptr().add(i)), load(s2.as_ptr().add(i))))
        };
        if !eq {
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
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
#[must_use]
pub unsafe fn skipspace_cmpeq(src: &[u8]) -> usize {
    let mut i = 0;
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let space = vdupq_n_u8(b' ');
        let tab = vdupq_n_u8(b'\t');
        let lf = vdupq_n_u8(b'\n');
        let cr = vdupq_n_u8(b'\r');
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let ws = vorrq_u8(
                vorrq_u8(vceqq_u8(v, space), vceqq_u8(v, tab)),
                vorrq_u8(vceqq_u8(v, lf), vceqq_u8(v, cr)),
            );
            if !all_lanes(ws) {
                break;
            }
            i += LANES;
        }
    }
    i + naive::skipspace(&src[i..])
}

/// 16-lane [`naive::skipspace`] using the `tbl` nibble table.
///
/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
#[must_use]
pub unsafe fn skipspace_shuffle(src: &[u8]) -> usize {
    let mut i = 0;
    while i + LANES <= src.len() {
        // SAFETY: `i + LANES <= src.len()`.
        let ws = unsafe { all_lanes(space_lanes(load(src.as_ptr().add(i)))) };
        if !ws {
            break;
        }
        i += LANES;
    }
    i + naive::skipspace(&src[i..])
}

pub use self::skipspace_shuffle as skipspace;

/// # Safety
///
/// NEON, plus the pointer contract of [`super::tolower_scalar`].
#[target_feature(enable = "neon")]
unsafe fn tolower_raw(dst: *mut u8, src: *const u8, len: usize) {
    let mut i = 0;
    // SAFETY: loads and stores stay below `len`; each lane is read before
    // the store that covers it.
    unsafe {
        let a = vdupq_n_u8(b'A');
        let z = vdupq_n_u8(b'Z');
        let delta = vdupq_n_u8(0x20);
        while i + LANES <= len {
            let v = load(src.add(i));
            let upper = vandq_u8(vcgeq_u8(v, a), vcleq_u8(v, z));
            vst1q_u8(dst.add(i), vaddq_u8(v, vandq_u8(upper, delta)));
            i += LANES;
        }
        tolower_scalar(dst.add(i), src.add(i), len - i);
    }
}

/// 16-lane [`naive::tolower`].
///
/// # Safety
///
/// The CPU must support NEON.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "neon")]
pub unsafe fn tolower(dst: &mut [u8], src: &[u8]) {
    assert!(dst.len() >= src.len(), "tolower: destination too small");
    // SAFETY: both spans hold `src.len()` bytes and are distinct borrows.
    unsafe { tolower_raw(dst.as_mut_ptr(), src.as_ptr(), src.len()) }
}

/// 16-lane [`naive::tolower_in_place`].
///
/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
pub unsafe fn tolower_in_place(buf: &mut [u8]) {
    let p = buf.as_mut_ptr();
    // SAFETY: source and destination are the same live buffer.
    unsafe { tolower_raw(p, p, buf.len()) }
}

/// 16-lane [`naive::compact`].
///
/// # Safety
///
/// The CPU must support NEON.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
#[target_feature(enable = "neon")]
pub unsafe fn compact(dst: &mut [u8], src: &[u8]) -> usize {
    assert!(dst.len() >= src.len(), "compact: destination too small");
    let (mut i, mut j) = (0, 0);
    let out = dst.as_mut_ptr();
    let mut tmp = [0u8; 8];
    while i + LANES <= src.len() {
        // SAFETY: `j <= i`, so `dst` has room for a full chunk at `j`.
        unsafe {
            let v = load(src.as_ptr().add(i));
            let keep = !movemask(space_lanes(v)) & 0xFFFF;
            if keep == 0xFFFF {
                vst1q_u8(out.add(j), v);
                j += LANES;
            } else if keep != 0 {
                for (half, bits) in [(vget_low_u8(v), keep & 0xFF), (vget_high_u8(v), keep >> 8)] {
                    let idx = vld1_u8(COMPACT_LUT[bits as usize].as_ptr());
                    vst1_u8(tmp.as_mut_ptr(), vtbl1_u8(half, idx));
                    let n = bits.count_ones() as usize;
                    ptr::copy_nonoverlapping(tmp.as_ptr(), out.add(j), n);
                    j += n;
                }
            }
        }
        i += LANES;
    }
    j + naive::compact(&mut dst[j..], &src[i..])
}

/// 16-lane [`naive::qstrlen`].
///
/// # Safety
///
/// The CPU must support NEON.
///
/// # Errors
///
/// Same as [`naive::qstrlen`].
#[target_feature(enable = "neon")]
pub unsafe fn qstrlen(src: &[u8]) -> Result<usize, QuoteError> {
    let mut scan = QuoteScan::new();
    let mut i = match scan.resolve(src, 0) {
        ControlFlow::Continue(i) => i,
        ControlFlow::Break(done) => return done,
    };
    // SAFETY: every load is at `i` with `i + LANES <= src.len()`.
    unsafe {
        let quote = vdupq_n_u8(b'"');
        let backslash = vdupq_n_u8(b'\\');
        while i + LANES <= src.len() {
            let v = load(src.as_ptr().add(i));
            let special = movemask(vorrq_u8(vceqq_u8(v, quote), vceqq_u8(v, backslash)));
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

/// 16-lane [`naive::strstr`].
///
/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
#[must_use]
pub unsafe fn strstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let Some((&first, _)) = needle.split_first() else {
        return Some(0);
    };
    if needle.len() > haystack.len() {
        return None;
    }
    let last = needle.len() - 1;
    let mut i = 0;
    // SAFETY: both loads end at `i + last + LANES <= haystack.len()`.
    unsafe {
        let first_v = vdupq_n_u8(first);
        let last_v = vdupq_n_u8(needle[last]);
        while i + last + LANES <= haystack.len() {
            let head = vceqq_u8(first_v, load(haystack.as_ptr().add(i)));
            let tail = vceqq_u8(last_v, load(haystack.as_ptr().add(i + last)));
            let mut candidates = movemask(vandq_u8(head, tail));
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
