//! Vector tiers.
//!
//! Each submodule exposes the same operations as [`crate::naive`] with the
//! same signatures, as `unsafe fn`s compiled for one instruction set:
//!
//! | module | lanes | target features |
//! |---|---|---|
//! | [`sse`] | 16 | `ssse3` |
//! | [`avx2`] | 32 | `avx2` |
//! | `avx512` | 64 | `avx512f,avx512bw` (cargo feature `avx512`) |
//! | `neon` | 16 | `neon` (aarch64) |
//!
//! Whatever does not fill a whole register is handed down to the next
//! narrower x86 tier, and finally to the scalar reference.
//!
//! # Safety
//!
//! Calling any function of a tier requires the CPU to support that tier's
//! target features. [`Tier::is_available`](crate::Tier::is_available) checks
//! this, and [`Scanner`](crate::Scanner) calls tiers only after checking.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod avx2;
#[cfg(all(feature = "avx512", target_arch = "x86_64"))]
pub mod avx512;
#[cfg(target_arch = "aarch64")]
pub mod neon;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod sse;

/// Shuffle indices that pack the set bits of an 8-lane keep mask to the
/// front. Unused lanes hold `0x80`, which both `pshufb` and `tbl` turn into 0.
#[cfg(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))]
pub(crate) static COMPACT_LUT: [[u8; 8]; 256] = build_compact_lut();

#[cfg(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))]
#[allow(clippy::cast_possible_truncation)]
const fn build_compact_lut() -> [[u8; 8]; 256] {
    let mut lut = [[0x80u8; 8]; 256];
    let mut mask = 0;
    while mask < 256 {
        let mut out = 0;
        let mut lane = 0;
        while lane < 8 {
            if mask & (1 << lane) != 0 {
                lut[mask][out] = lane as u8;
                out += 1;
            }
            lane += 1;
        }
        mask += 1;
    }
    lut
}

/// Lookup table for the shuffle whitespace test: entry `n` is the whitespace
/// byte whose low nibble is `n`, or 0. No two whitespace bytes share a low
/// nibble, so `table[b & 0xF] == b` holds exactly for whitespace.
#[cfg(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))]
pub(crate) const SPACE_TABLE: [u8; 16] = [
    b' ', 0, 0, 0, 0, 0, 0, 0, 0, b'\t', b'\n', 0, 0, b'\r', 0, 0,
];

/// Scalar case fold over raw pointers, for tails of in-place capable tiers.
///
/// # Safety
///
/// `src` must be readable and `dst` writable for `len` bytes. They may be
/// equal but must not otherwise overlap.
#[cfg(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))]
#[inline]
pub(crate) unsafe fn tolower_scalar(dst: *mut u8, src: *const u8, len: usize) {
    for k in 0..len {
        // SAFETY: `k < len`, in bounds for both pointers per the contract.
        unsafe {
            let b = *src.add(k);
            *dst.add(k) = if b.is_ascii_uppercase() { b + 0x20 } else { b };
        }
    }
}
