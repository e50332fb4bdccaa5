#![no_main]
use std::cell::RefCell;

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng; // faster than StdRng
use rand::{Rng, SeedableRng};
use simdstr::{Scanner, Tier};

thread_local! {
    // One SmallRng per thread, seeded once from the host OS
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

/// Bytes every primitive branches on.
static STRUCTURAL: &[u8] = b" \t\n\r\\\"AZ";

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Let libFuzzer mutate, then sometimes splice in a run of structural bytes
/// long enough to cross a vector chunk boundary.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    let size = fuzzer_mutate(data, size, max_size);
    if size < 2 || !seed.is_multiple_of(4) {
        return size;
    }
    with_rng(|rng| {
        let at = rng.random_range(1..size);
        let run = rng.random_range(1..=(size - at).min(80));
        let byte = STRUCTURAL[rng.random_range(0..STRUCTURAL.len())];
        for b in &mut data[at..at + run] {
            // Escapes come in pairs often enough to keep strings well formed.
            *b = if byte == b'\\' && rng.random_bool(0.5) { b'"' } else { byte };
        }
    });
    size
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug, Arbitrary)]
enum Op {
    Memcmpeq { flip: u16 },
    Skipspace,
    Tolower,
    Compact,
    Qstrlen,
    Strstr { needle_len: u8 },
}

fn check(op: &Op, src: &[u8]) {
    let reference = Scanner::naive();
    for tier in Tier::available() {
        let Ok(scanner) = Scanner::new(tier) else {
            continue;
        };
        match *op {
            Op::Memcmpeq { flip } => {
                let mut other = src.to_vec();
                if !other.is_empty() {
                    let at = usize::from(flip) % other.len();
                    other[at] ^= (flip >> 8) as u8;
                }
                assert_eq!(
                    scanner.memcmpeq(src, &other),
                    reference.memcmpeq(src, &other),
                    "{tier}"
                );
            }
            Op::Skipspace => {
                assert_eq!(scanner.skipspace(src), reference.skipspace(src), "{tier}");
            }
            Op::Tolower => {
                let mut got = vec![0u8; src.len()];
                let mut want = vec![0u8; src.len()];
                scanner.tolower(&mut got, src);
                reference.tolower(&mut want, src);
                assert_eq!(got, want, "{tier}");
                let mut in_place = src.to_vec();
                scanner.tolower_in_place(&mut in_place);
                assert_eq!(in_place, want, "{tier}");
            }
            Op::Compact => {
                let mut got = vec![0xAAu8; src.len()];
                let mut want = vec![0xAAu8; src.len()];
                assert_eq!(
                    scanner.compact(&mut got, src),
                    reference.compact(&mut want, src),
                    "{tier}"
                );
                assert_eq!(got, want, "{tier}");
            }
            Op::Qstrlen => {
                assert_eq!(scanner.qstrlen(src), reference.qstrlen(src), "{tier}");
            }
            Op::Strstr { needle_len } => {
                let split = usize::from(needle_len).min(src.len());
                let (needle, haystack) = src.split_at(split);
                assert_eq!(
                    scanner.strstr(haystack, needle),
                    reference.strstr(haystack, needle),
                    "{tier}"
                );
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(op) = Op::arbitrary(&mut u) else {
        return;
    };
    check(&op, u.take_rest());
});
