//! Benchmark – every primitive on every available tier.
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{
    BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use simdstr::{Scanner, Tier, naive};

const LEN: usize = 10_000;

/// Uniform random 7-bit ASCII, fixed seed so every run sees the same bytes.
fn gen_ascii(len: usize) -> Vec<u8> {
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    (0..len).map(|_| rng.random::<u8>() % 128).collect()
}

fn quote(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2 + 2);
    out.push(b'"');
    for &b in s {
        if b == b'"' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
    out
}

fn scanners() -> impl Iterator<Item = Scanner> {
    Tier::available().filter_map(|tier| Scanner::new(tier).ok())
}

fn bench_memcmpeq(c: &mut Criterion) {
    let s1 = gen_ascii(LEN);
    let s2 = s1.clone();
    let mut group = c.benchmark_group("memcmpeq");
    group.throughput(Throughput::Bytes(LEN as u64));
    for scanner in scanners() {
        assert!(scanner.memcmpeq(&s1, &s2));
        group.bench_function(BenchmarkId::from_parameter(scanner.tier()), |b| {
            b.iter(|| scanner.memcmpeq(black_box(&s1), black_box(&s2)));
        });
    }
    group.finish();
}

fn bench_skipspace(c: &mut Criterion) {
    let mut data = vec![b' '; LEN];
    data.push(b'x');
    let mut group = c.benchmark_group("skipspace");
    group.throughput(Throughput::Bytes(LEN as u64));
    for scanner in scanners() {
        assert_eq!(scanner.skipspace(&data), LEN);
        group.bench_function(BenchmarkId::from_parameter(scanner.tier()), |b| {
            b.iter(|| scanner.skipspace(black_box(&data)));
        });
    }
    group.finish();
}

fn bench_tolower(c: &mut Criterion) {
    let data = gen_ascii(LEN);
    let mut expected = vec![0u8; LEN];
    naive::tolower(&mut expected, &data);
    let mut group = c.benchmark_group("tolower");
    group.throughput(Throughput::Bytes(LEN as u64));
    for scanner in scanners() {
        let mut buf = vec![0u8; LEN];
        scanner.tolower(&mut buf, &data);
        assert_eq!(buf, expected, "{}", scanner.tier());
        group.bench_function(BenchmarkId::from_parameter(scanner.tier()), |b| {
            b.iter(|| scanner.tolower(black_box(&mut buf), black_box(&data)));
        });
    }
    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let data = gen_ascii(LEN);
    let mut expected = vec![0u8; LEN];
    let n = naive::compact(&mut expected, &data);
    let mut group = c.benchmark_group("compact");
    group.throughput(Throughput::Bytes(LEN as u64));
    for scanner in scanners() {
        let mut buf = vec![0u8; LEN];
        assert_eq!(scanner.compact(&mut buf, &data), n, "{}", scanner.tier());
        assert_eq!(buf[..n], expected[..n], "{}", scanner.tier());
        group.bench_function(BenchmarkId::from_parameter(scanner.tier()), |b| {
            b.iter(|| scanner.compact(black_box(&mut buf), black_box(&data)));
        });
    }
    group.finish();
}

fn bench_qstrlen(c: &mut Criterion) {
    let data = quote(&gen_ascii(LEN));
    let mut group = c.benchmark_group("qstrlen");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for scanner in scanners() {
        assert_eq!(scanner.qstrlen(&data), Ok(LEN), "{}", scanner.tier());
        group.bench_function(BenchmarkId::from_parameter(scanner.tier()), |b| {
            b.iter(|| scanner.qstrlen(black_box(&data)));
        });
    }
    group.finish();
}

fn bench_strstr(c: &mut Criterion) {
    let needle = b"hello";
    let mut data = gen_ascii(LEN);
    data.extend_from_slice(needle);
    let expected = naive::strstr(&data, needle);
    let mut group = c.benchmark_group("strstr");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for scanner in scanners() {
        assert_eq!(scanner.strstr(&data, needle), expected, "{}", scanner.tier());
        group.bench_function(BenchmarkId::from_parameter(scanner.tier()), |b| {
            b.iter(|| scanner.strstr(black_box(&data), black_box(needle)));
        });
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(1))
            .measurement_time(Duration::from_secs(3));
    }
    c
}

criterion_group! {
    name = benches;
    config = criterion();
    targets = bench_memcmpeq, bench_skipspace, bench_tolower, bench_compact, bench_qstrlen, bench_strstr
}
criterion_main!(benches);
