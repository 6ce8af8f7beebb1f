use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use std::hint::black_box;

use cryptorand_core::bignum::{mod_exp, Bignum};
use cryptorand_core::drbg::ctr::{CtrDrbg, SEEDLEN as CTR_SEEDLEN};
use cryptorand_core::drbg::hmac::HmacDrbg;
use cryptorand_core::drbg::Drbg;
use cryptorand_core::entropy::Pool;
use cryptorand_core::trivium::Trivium;

fn ctr_drbg_generate(c: &mut Criterion) {
    let mut drbg = CtrDrbg::new();
    drbg.instantiate(&[0x42u8; CTR_SEEDLEN], None).unwrap();

    fn bench_generate<const N: usize>(c: &mut Criterion, drbg: &mut CtrDrbg) {
        c.bench_function(&format!("ctr_drbg generate {N} bytes"), |b| {
            b.iter(|| {
                let mut out = [0u8; N];
                drbg.generate(&mut out, None).unwrap();
                black_box(out);
            })
        });
    }

    bench_generate::<16>(c, &mut drbg);
    bench_generate::<64>(c, &mut drbg);
    bench_generate::<4096>(c, &mut drbg);
}

fn hmac_drbg_generate(c: &mut Criterion) {
    let mut drbg = HmacDrbg::new();
    drbg.instantiate(b"benchmark entropy input, 48 bytes minimum!!!!!!", b"benchmark nonce", None)
        .unwrap();

    fn bench_generate<const N: usize>(c: &mut Criterion, drbg: &mut HmacDrbg) {
        c.bench_function(&format!("hmac_drbg generate {N} bytes"), |b| {
            b.iter(|| {
                let mut out = [0u8; N];
                drbg.generate(&mut out, None).unwrap();
                black_box(out);
            })
        });
    }

    bench_generate::<16>(c, &mut drbg);
    bench_generate::<64>(c, &mut drbg);
    bench_generate::<4096>(c, &mut drbg);
}

fn trivium_fill(c: &mut Criterion) {
    let pool = Pool::new();
    pool.start().unwrap();
    let mut trivium = Trivium::start(pool).unwrap();

    c.bench_function("trivium fill 4096 bytes", |b| {
        b.iter(|| {
            let mut out = [0u8; 4096];
            trivium.fill_bytes(&mut out).unwrap();
            black_box(out);
        })
    });
}

fn bignum_mod_exp(c: &mut Criterion) {
    let base = Bignum::read_string(16, &"ab".repeat(64)).unwrap();
    let exp = Bignum::read_string(16, &"3".repeat(64)).unwrap();
    let modulus = {
        let candidate = Bignum::read_string(16, &"f".repeat(64)).unwrap();
        candidate.add(&Bignum::from_u64(if candidate.is_even() { 1 } else { 0 }))
    };

    c.bench_function("bignum mod_exp 256-bit", |b| {
        b.iter(|| {
            let (result, _) = mod_exp(&base, &exp, &modulus, None).unwrap();
            black_box(result);
        })
    });
}

fn bignum_mul(c: &mut Criterion) {
    let a = Bignum::read_string(16, &"ab".repeat(128)).unwrap();
    let b = Bignum::read_string(16, &"cd".repeat(128)).unwrap();

    c.bench_function("bignum mul 1024-bit", |bencher| {
        bencher.iter(|| black_box(a.mul(&b)));
    });
}

criterion_group!(
    benches,
    ctr_drbg_generate,
    hmac_drbg_generate,
    trivium_fill,
    bignum_mod_exp,
    bignum_mul
);
criterion_main!(benches);
