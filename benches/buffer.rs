#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use lseco::SecureBuffer;

fn compare(c: &mut Criterion) {
    c.bench_function("secure buffer create", |b| {
        b.iter(|| SecureBuffer::new(black_box(32)).expect("error creating buffer"))
    });

    for size in [32usize, 4096, 65536] {
        let payload = vec![0x5au8; size];

        c.bench_function(&format!("secure buffer write {} bytes", size), |b| {
            let mut buf = SecureBuffer::new(size).expect("error creating buffer");
            b.iter(|| buf.write(black_box(&payload)).expect("error writing"))
        });

        c.bench_function(&format!("secure buffer read {} bytes", size), |b| {
            let buf = SecureBuffer::new(size).expect("error creating buffer");
            let mut out = vec![0u8; size];
            b.iter(|| {
                buf.read(black_box(&mut out)).expect("error reading");
            })
        });
    }

    c.bench_function("secure buffer destroy", |b| {
        b.iter_batched(
            || SecureBuffer::new(32).expect("error creating buffer"),
            |mut buf| buf.destroy(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, compare);
criterion_main!(benches);
