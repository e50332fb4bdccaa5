//! Tier selection.
//!
//! Primitives never pick their own implementation. A [`Tier`] names one, the
//! check in [`Tier::is_available`] says whether this machine can run it, and a
//! [`Scanner`] binds a checked tier to safe method calls.

use core::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU8, Ordering},
};

use log::{debug, trace};

use crate::{QuoteError, UnknownTier, UnsupportedTier, naive};

/// One implementation of the primitive set.
///
/// Scalar tiers come first, then the vector tiers of each architecture from
/// narrowest to widest. Every variant can be named on every target; the ones
/// that cannot run here are simply never [available](Tier::is_available).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Tier {
    /// The scalar reference in [`crate::naive`].
    Naive,
    /// The reference, except for a branch-free `memcmpeq` left to the
    /// compiler's auto-vectorizer.
    Autovec,
    /// 16 lanes, x86 SSSE3.
    Sse,
    /// 32 lanes, x86 AVX2.
    Avx2,
    /// 64 lanes, x86-64 AVX-512F/BW. Needs the `avx512` cargo feature.
    Avx512,
    /// 16 lanes, aarch64 NEON.
    Neon,
}

impl Tier {
    /// Every tier, in declaration order.
    pub const ALL: [Tier; 6] = [
        Tier::Naive,
        Tier::Autovec,
        Tier::Sse,
        Tier::Avx2,
        Tier::Avx512,
        Tier::Neon,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tier::Naive => "naive",
            Tier::Autovec => "autovec",
            Tier::Sse => "sse",
            Tier::Avx2 => "avx2",
            Tier::Avx512 => "avx512",
            Tier::Neon => "neon",
        }
    }

    /// Bytes processed per vector iteration; 1 for the scalar tiers.
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Tier::Naive | Tier::Autovec => 1,
            Tier::Sse | Tier::Neon => 16,
            Tier::Avx2 => 32,
            Tier::Avx512 => 64,
        }
    }

    /// Whether this build can run the tier on this CPU.
    ///
    /// With the `std` feature the CPU is queried at runtime; without it only
    /// the features enabled at compile time count.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Tier::Naive | Tier::Autovec => true,
            Tier::Sse | Tier::Avx2 | Tier::Avx512 => x86_available(self),
            Tier::Neon => neon_available(),
        }
    }

    /// The widest available tier.
    ///
    /// [`Tier::Autovec`] is never picked: it only differs from the reference
    /// for `memcmpeq`. The CPU is queried on the first call and the answer is
    /// cached for the life of the process.
    #[must_use]
    pub fn detect() -> Tier {
        match DETECTED.load(Ordering::Relaxed) {
            UNDETECTED => {
                let tier = Tier::widest_available();
                DETECTED.store(tier as u8, Ordering::Relaxed);
                debug!("detected string scanning tier: {tier}");
                tier
            }
            cached => Tier::ALL[usize::from(cached)],
        }
    }

    /// Widest available tier, without the cache.
    fn widest_available() -> Tier {
        [Tier::Avx512, Tier::Avx2, Tier::Sse, Tier::Neon]
            .into_iter()
            .find(|tier| tier.is_available())
            .unwrap_or(Tier::Naive)
    }

    /// All tiers this machine can run, in declaration order.
    pub fn available() -> impl Iterator<Item = Tier> {
        Tier::ALL.into_iter().filter(|tier| tier.is_available())
    }
}

/// `Tier::detect` result as its index into [`Tier::ALL`].
static DETECTED: AtomicU8 = AtomicU8::new(UNDETECTED);
const UNDETECTED: u8 = u8::MAX;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn x86_available(tier: Tier) -> bool {
    #[cfg(feature = "std")]
    {
        match tier {
            Tier::Sse => std::arch::is_x86_feature_detected!("ssse3"),
            Tier::Avx2 => std::arch::is_x86_feature_detected!("avx2"),
            #[cfg(all(feature = "avx512", target_arch = "x86_64"))]
            Tier::Avx512 => {
                std::arch::is_x86_feature_detected!("avx512f")
                    && std::arch::is_x86_feature_detected!("avx512bw")
            }
            _ => false,
        }
    }
    #[cfg(not(feature = "std"))]
    {
        match tier {
            Tier::Sse => cfg!(target_feature = "ssse3"),
            Tier::Avx2 => cfg!(target_feature = "avx2"),
            Tier::Avx512 => cfg!(all(
                feature = "avx512",
                target_arch = "x86_64",
                target_feature = "avx512f",
                target_feature = "avx512bw"
            )),
            _ => false,
        }
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn x86_available(_tier: Tier) -> bool {
    false
}

fn neon_available() -> bool {
    #[cfg(all(target_arch = "aarch64", feature = "std"))]
    {
        std::arch::is_aarch64_feature_detected!("neon")
    }
    #[cfg(all(target_arch = "aarch64", not(feature = "std")))]
    {
        cfg!(target_feature = "neon")
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        false
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(UnknownTier)
    }
}

/// Route one primitive call to the scanner's tier.
///
/// Tiers without a vector body on this target fall through to the reference;
/// `Scanner::new` never admits a tier this CPU cannot run.
macro_rules! dispatch {
    ($self:ident, $op:ident ( $($arg:expr),* )) => {
        match $self.tier {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            // SAFETY: `Scanner` only holds available tiers.
            Tier::Sse => unsafe { crate::simd::sse::$op($($arg),*) },
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            // SAFETY: as above.
            Tier::Avx2 => unsafe { crate::simd::avx2::$op($($arg),*) },
            #[cfg(all(feature = "avx512", target_arch = "x86_64"))]
            // SAFETY: as above.
            Tier::Avx512 => unsafe { crate::simd::avx512::$op($($arg),*) },
            #[cfg(target_arch = "aarch64")]
            // SAFETY: as above.
            Tier::Neon => unsafe { crate::simd::neon::$op($($arg),*) },
            _ => naive::$op($($arg),*),
        }
    };
}

/// A tier that has been checked against the running CPU, with safe access to
/// every primitive.
///
/// ```rust
/// use simdstr::{Scanner, Tier};
///
/// let scanner = Scanner::new(Tier::Naive).unwrap();
/// let mut buf = *b"Hello!";
/// scanner.tolower_in_place(&mut buf);
/// assert_eq!(&buf, b"hello!");
/// assert_eq!(scanner.skipspace(b" \t\r\nx"), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanner {
    tier: Tier,
}

impl Scanner {
    /// A scanner running `tier`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedTier`] if the tier is not available here.
    pub fn new(tier: Tier) -> Result<Self, UnsupportedTier> {
        if !tier.is_available() {
            return Err(UnsupportedTier { tier });
        }
        trace!("string scanner using {tier} ({} lanes)", tier.lanes());
        Ok(Self { tier })
    }

    /// A scanner running the widest available tier.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            tier: Tier::detect(),
        }
    }

    /// A scanner running the scalar reference.
    #[must_use]
    pub const fn naive() -> Self {
        Self { tier: Tier::Naive }
    }

    /// The tier this scanner runs.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// See [`naive::memcmpeq`].
    #[must_use]
    pub fn memcmpeq(&self, s1: &[u8], s2: &[u8]) -> bool {
        if self.tier == Tier::Autovec {
            return naive::memcmpeq_autovec(s1, s2);
        }
        dispatch!(self, memcmpeq(s1, s2))
    }

    /// See [`naive::skipspace`].
    #[must_use]
    pub fn skipspace(&self, src: &[u8]) -> usize {
        dispatch!(self, skipspace(src))
    }

    /// See [`naive::tolower`].
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than `src`.
    pub fn tolower(&self, dst: &mut [u8], src: &[u8]) {
        dispatch!(self, tolower(dst, src));
    }

    /// See [`naive::tolower_in_place`].
    pub fn tolower_in_place(&self, buf: &mut [u8]) {
        dispatch!(self, tolower_in_place(buf));
    }

    /// See [`naive::compact`].
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than `src`.
    pub fn compact(&self, dst: &mut [u8], src: &[u8]) -> usize {
        dispatch!(self, compact(dst, src))
    }

    /// See [`naive::qstrlen`].
    ///
    /// # Errors
    ///
    /// Same as [`naive::qstrlen`].
    pub fn qstrlen(&self, src: &[u8]) -> Result<usize, QuoteError> {
        dispatch!(self, qstrlen(src))
    }

    /// See [`naive::strstr`].
    #[must_use]
    pub fn strstr(&self, haystack: &[u8], needle: &[u8]) -> Option<usize> {
        dispatch!(self, strstr(haystack, needle))
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::detect()
    }
}

impl TryFrom<Tier> for Scanner {
    type Error = UnsupportedTier;

    fn try_from(tier: Tier) -> Result<Self, Self::Error> {
        Self::new(tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_indexed_by_discriminant() {
        for (i, tier) in Tier::ALL.into_iter().enumerate() {
            assert_eq!(tier as usize, i);
        }
    }

    #[test]
    fn detect_is_cached() {
        let first = Tier::detect();
        assert_ne!(DETECTED.load(Ordering::Relaxed), UNDETECTED);
        assert_eq!(first, Tier::widest_available());
        for _ in 0..3 {
            assert_eq!(Tier::detect(), first);
            assert_eq!(Scanner::detect().tier(), first);
            assert_eq!(Scanner::default().tier(), first);
        }
    }
}
