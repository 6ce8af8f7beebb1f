//! DRBG determinism and backtracking-resistance properties (§8).
//!
//! The CAVS `drbgvectors_pr_false` response files scenarios 1-3 call for
//! aren't part of this pack (no `original_source/` test-vector data for
//! them), so literal byte-for-byte vectors aren't reproduced here — see
//! DESIGN.md. What's covered instead is the property the vectors exist
//! to pin down: same seed and inputs reproduce identical output, and the
//! backtracking-resistance update changes state even with identical
//! additional input.

use cryptorand_core::drbg::ctr::{CtrDrbg, SEEDLEN as CTR_SEEDLEN};
use cryptorand_core::drbg::hash::HashDrbg;
use cryptorand_core::drbg::hmac::HmacDrbg;
use cryptorand_core::drbg::Drbg;

#[test]
fn ctr_drbg_same_seed_reproduces_identical_first_output() {
    let entropy = [0x7au8; CTR_SEEDLEN];

    let mut a = CtrDrbg::new();
    a.instantiate(&entropy, None).unwrap();
    let mut out_a = [0u8; 64];
    a.generate(&mut out_a, None).unwrap();

    let mut b = CtrDrbg::new();
    b.instantiate(&entropy, None).unwrap();
    let mut out_b = [0u8; 64];
    b.generate(&mut out_b, None).unwrap();

    assert_eq!(out_a, out_b);
}

#[test]
fn ctr_drbg_consecutive_generates_differ_with_identical_additional_input() {
    let mut drbg = CtrDrbg::new();
    drbg.instantiate(&[0x11u8; CTR_SEEDLEN], None).unwrap();

    let ai = [0x22u8; 16];
    let mut first = [0u8; 64];
    let mut second = [0u8; 64];
    drbg.generate(&mut first, Some(&ai)).unwrap();
    drbg.generate(&mut second, Some(&ai)).unwrap();

    assert_ne!(first, second);
}

#[test]
fn ctr_drbg_zero_length_generate_is_a_no_op_that_still_advances_state() {
    let mut drbg = CtrDrbg::new();
    drbg.instantiate(&[0x33u8; CTR_SEEDLEN], None).unwrap();

    let mut empty: [u8; 0] = [];
    drbg.generate(&mut empty, None).unwrap();

    let mut after_noop = [0u8; 32];
    drbg.generate(&mut after_noop, None).unwrap();

    let mut fresh = CtrDrbg::new();
    fresh.instantiate(&[0x33u8; CTR_SEEDLEN], None).unwrap();
    let mut direct = [0u8; 32];
    fresh.generate(&mut direct, None).unwrap();

    // The no-op generate still perturbs internal state (V increments for
    // the update step even with zero requested bytes), so the output
    // right after it differs from a fresh instance's first output.
    assert_ne!(after_noop, direct);
}

#[test]
fn hash_drbg_same_seed_reproduces_identical_first_output() {
    let entropy = [0x55u8; 64];
    let nonce = [0x66u8; 32];

    let mut a = HashDrbg::new();
    a.instantiate(&entropy, &nonce, None).unwrap();
    let mut out_a = [0u8; 64];
    a.generate(&mut out_a, None).unwrap();

    let mut b = HashDrbg::new();
    b.instantiate(&entropy, &nonce, None).unwrap();
    let mut out_b = [0u8; 64];
    b.generate(&mut out_b, None).unwrap();

    assert_eq!(out_a, out_b);
}

#[test]
fn hash_df_rejects_outlen_past_255_times_64() {
    assert!(HashDrbg::hash_df(b"seed", 255 * 64).is_ok());
    assert!(HashDrbg::hash_df(b"seed", 255 * 64 + 1).is_err());
}

#[test]
fn hmac_drbg_same_seed_reproduces_identical_first_output() {
    let entropy = b"hmac determinism entropy, at least 32 bytes!!!!";
    let nonce = b"hmac determinism nonce";

    let mut a = HmacDrbg::new();
    a.instantiate(entropy, nonce, None).unwrap();
    let mut out_a = [0u8; 64];
    a.generate(&mut out_a, None).unwrap();

    let mut b = HmacDrbg::new();
    b.instantiate(entropy, nonce, None).unwrap();
    let mut out_b = [0u8; 64];
    b.generate(&mut out_b, None).unwrap();

    assert_eq!(out_a, out_b);
}

#[test]
fn hmac_drbg_consecutive_generates_differ_with_identical_additional_input() {
    let mut drbg = HmacDrbg::new();
    drbg
        .instantiate(b"hmac backtracking entropy, at least 32 bytes!!!", b"nonce", None)
        .unwrap();

    let ai = [0x99u8; 16];
    let mut first = [0u8; 64];
    let mut second = [0u8; 64];
    drbg.generate(&mut first, Some(&ai)).unwrap();
    drbg.generate(&mut second, Some(&ai)).unwrap();

    assert_ne!(first, second);
}
