use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kontig::kmer::{Base, Kmer};
use kontig::minimizer::Minimizer;

fn kmer_ops(c: &mut Criterion) {
    let seq31 = "ACGTACGTTAGCCATGACGTACGTTAGCCAT";
    let km: Kmer = seq31.parse().unwrap();

    c.bench_function("kmer_from_ascii_31", |b| {
        b.iter(|| Kmer::from_ascii(black_box(seq31.as_bytes())).unwrap())
    });

    c.bench_function("kmer_twin_31", |b| b.iter(|| black_box(&km).twin()));

    c.bench_function("kmer_rep_31", |b| b.iter(|| black_box(&km).rep()));

    c.bench_function("kmer_forward_base_31", |b| {
        b.iter(|| black_box(&km).forward_base(Base::G))
    });

    c.bench_function("kmer_canonical_hash_31", |b| {
        b.iter(|| black_box(&km).canonical_hash())
    });

    c.bench_function("minimizer_of_31_23", |b| {
        b.iter(|| Minimizer::of(black_box(&km), 23))
    });
}

fn sliding_scan(c: &mut Criterion) {
    // A 10 kb pseudo-random sequence scanned at k=31.
    let mut state = 0x9E37_79B9u64;
    let seq: Vec<u8> = (0..10_000)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            match (state >> 33) & 0x3 {
                0 => b'A',
                1 => b'C',
                2 => b'G',
                _ => b'T',
            }
        })
        .collect();

    c.bench_function("sliding_canonical_kmers_10kb_k31", |b| {
        b.iter(|| {
            let mut cur = Kmer::from_ascii(&seq[..31]).unwrap();
            let mut acc = 0u64;
            acc ^= cur.canonical_hash();
            for &byte in &seq[31..] {
                let base = Base::from_ascii(byte).unwrap();
                cur = cur.forward_base(base);
                acc ^= cur.canonical_hash();
            }
            acc
        })
    });
}

criterion_group!(benches, kmer_ops, sliding_scan);
criterion_main!(benches);
