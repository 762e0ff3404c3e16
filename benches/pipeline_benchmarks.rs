use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shared_secret_encrypt::{EnvelopeEngine, SecretSharing, ShareProtector};

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let engine = EnvelopeEngine::default();

    for size in [64, 4096, 65536] {
        let data = vec![0x11u8; size];
        let (envelope, key) = engine.encrypt(&data).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encrypt", size), &data, |b, data| {
            b.iter(|| black_box(engine.encrypt(black_box(data)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &envelope, |b, env| {
            b.iter(|| black_box(engine.decrypt(black_box(env), &key).unwrap()));
        });
    }

    group.finish();
}

fn bench_seal_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal_open");
    let sharing = SecretSharing::builder(5, 3).build().unwrap();

    for size in [64, 4096, 65536] {
        let data = vec![0x22u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let sealed = sharing.seal(black_box(data)).unwrap();
                black_box(
                    sharing
                        .open(&sealed.envelope, &sealed.shares[2..], None)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_protection(c: &mut Criterion) {
    let mut group = c.benchmark_group("protection");
    group.sample_size(10);
    let protector = ShareProtector::default();
    let share = [0x33u8; 33];
    let bundle = protector.protect(&share, "correct-horse").unwrap();

    group.bench_function("protect", |b| {
        b.iter(|| black_box(protector.protect(black_box(&share), "correct-horse").unwrap()));
    });
    group.bench_function("unprotect", |b| {
        b.iter(|| black_box(protector.unprotect(black_box(&bundle), "correct-horse").unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_envelope, bench_seal_open, bench_protection);
criterion_main!(benches);
