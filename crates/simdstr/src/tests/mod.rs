mod properties;

use quickcheck::QuickCheck;

use crate::{Scanner, Tier};

/// One scanner per tier this machine can run.
pub(crate) fn scanners() -> Vec<Scanner> {
    Tier::available()
        .map(|tier| Scanner::new(tier).expect("available tier"))
        .collect()
}

/// Number of quickcheck cases per property.
pub(crate) fn quickcheck_tests() -> u64 {
    if cfg!(feature = "test-fast") {
        100
    } else if is_ci::cached() {
        10_000
    } else {
        1_000
    }
}

/// A runner using [`quickcheck_tests`] cases.
pub(crate) fn quickcheck() -> QuickCheck {
    QuickCheck::new().tests(quickcheck_tests())
}

/// Every `skipspace` flavor of every available tier, by name.
#[allow(clippy::type_complexity)]
pub(crate) fn skipspace_flavors() -> Vec<(&'static str, Box<dyn Fn(&[u8]) -> usize>)> {
    let mut flavors: Vec<(&'static str, Box<dyn Fn(&[u8]) -> usize>)> =
        vec![("naive", Box::new(crate::naive::skipspace))];

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        use crate::simd::{avx2, sse};
        if Tier::Sse.is_available() {
            flavors.push(("sse_cmpeq", Box::new(|s: &[u8]| unsafe { sse::skipspace_cmpeq(s) })));
            flavors.push(("sse_shuffle", Box::new(|s: &[u8]| unsafe { sse::skipspace_shuffle(s) })));
        }
        if Tier::Avx2.is_available() {
            flavors.push(("avx2_cmpeq", Box::new(|s: &[u8]| unsafe { avx2::skipspace_cmpeq(s) })));
            flavors.push(("avx2_shuffle", Box::new(|s: &[u8]| unsafe { avx2::skipspace_shuffle(s) })));
        }
    }
    #[cfg(all(feature = "avx512", target_arch = "x86_64"))]
    {
        use crate::simd::avx512;
        if Tier::Avx512.is_available() {
            flavors.push(("avx512_cmpeq", Box::new(|s: &[u8]| unsafe { avx512::skipspace_cmpeq(s) })));
            flavors.push(("avx512_shuffle", Box::new(|s: &[u8]| unsafe { avx512::skipspace_shuffle(s) })));
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        use crate::simd::neon;
        if Tier::Neon.is_available() {
            flavors.push(("neon_cmpeq", Box::new(|s: &[u8]| unsafe { neon::skipspace_cmpeq(s) })));
            flavors.push(("neon_shuffle", Box::new(|s: &[u8]| unsafe { neon::skipspace_shuffle(s) })));
        }
    }
    flavors
}
