//! Bignum round-trip, boundary, and literal-value properties (§8).

use cryptorand_core::bignum::{div_mod, gcd, mod_inverse, Bignum};

const A_HEX: &str = "79ffb5c63d18fadc6ee85b967401d24b9a80b683f67e6536a1ba1ecec362a9a0f8109fe311614c42f7a29b3230c77ee9560ae7a28ef20d7387c7e8be5c6383fc";
const B_HEX: &str = "482430327087ac340c011d003f8980d9d8d09e2626116baffe49d4ce5d470dc64941546382cd387169bcfdf1940b265ba1b9810affbb8b89dfa03abe47dadb47";
const C_HEX: &str = "22612a0d4cb6d1ae162b0ddd6f3c73317a445a98518b30b2a29ff1e18d635ddb7e6c4a91ecb0f7126faa2a91eb2cb4ef60929467040fa82221724d37b97af5a8e7202f15767e9393ff665bd4188eac9e9379269307052ce58a43626da76ccba3ce8383cbaafaacd878f94ec8702ff8c9f65ffe75773b6439c989b9360a1a2ee4";

#[test]
fn multiplication_matches_the_known_literal_product() {
    let a = Bignum::read_string(16, A_HEX).unwrap();
    let b = Bignum::read_string(16, B_HEX).unwrap();
    let c = Bignum::read_string(16, C_HEX).unwrap();
    assert_eq!(a.mul(&b), c);
}

#[test]
fn read_write_round_trips_for_every_radix() {
    let a = Bignum::read_string(16, A_HEX).unwrap();
    for radix in 2..=16u32 {
        let rendered = a.write_string(radix).unwrap();
        assert_eq!(Bignum::read_string(radix, &rendered).unwrap(), a);
    }
}

#[test]
fn product_divided_by_a_factor_recovers_the_other_factor_and_has_zero_remainder() {
    let a = Bignum::read_string(16, A_HEX).unwrap();
    let b = Bignum::read_string(16, B_HEX).unwrap();
    let product = a.mul(&b);
    let (q, r) = div_mod(&product, &b).unwrap();
    assert_eq!(q, a);
    assert!(r.is_zero());
}

#[test]
fn gcd_is_commutative_and_scales_with_a_common_factor() {
    let a = Bignum::from_u64(270);
    let b = Bignum::from_u64(192);
    let k = Bignum::from_u64(29);
    assert_eq!(gcd(&a, &b), gcd(&b, &a));
    assert_eq!(gcd(&a.mul(&k), &b.mul(&k)), gcd(&a, &b).mul(&k));
}

#[test]
fn modular_inverse_satisfies_the_defining_identity() {
    let a = Bignum::read_string(16, "9fd1c3a7").unwrap();
    let n = Bignum::read_string(16, "1000000000000000000000039").unwrap();
    let inv = mod_inverse(&a, &n).unwrap();
    let check = cryptorand_core::bignum::modulo(&a.mul(&inv), &n).unwrap();
    assert_eq!(check, Bignum::from_u64(1));
}

#[test]
fn shifting_by_zero_is_identity_and_large_shifts_equal_word_plus_bit_shift() {
    let a = Bignum::read_string(16, A_HEX).unwrap();
    assert_eq!(a.shl(0), a);
    assert_eq!(a.shr(0), a);

    // A shift of (32*n + k) must equal an n-word shift composed with a
    // k-bit shift, for both directions.
    let n = 3usize;
    let k = 7usize;
    let combined = a.shl(32 * n + k);
    let stepwise = a.shl(32 * n).shl(k);
    assert_eq!(combined, stepwise);

    let combined = a.shr(32 * n + k);
    let stepwise = a.shr(32 * n).shr(k);
    assert_eq!(combined, stepwise);
}
