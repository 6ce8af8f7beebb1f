//! Modular exponentiation by Montgomery ladder with a sliding window
//! (§4.I, HAC 14.85 / 14.94).
//!
//! The reference source computes the Montgomery constant `mm` as a single
//! machine word via Newton's-method bit tricks (`bn_montg_init`) and then
//! runs `bn_montmul` directly over raw limb slices. This module gets to
//! the same place — REDC multiplication without ever leaving Montgomery
//! form until the final reduction — by computing the Montgomery inverse
//! with the already-tested [`super::mod_inverse`] instead of the per-word
//! trick, and expressing REDC itself with `mul`/`add`/`sub`/`shl`/`shr`.
//! Slower, but every step runs through arithmetic this crate already
//! exercises elsewhere, which matters when nothing here gets compiled
//! before it ships.

use std::cmp::Ordering;

use super::{gcd::mod_inverse, modulo, Bignum};
use crate::error::BignumError;

/// `A^E mod N` (§4.I). Requires an odd modulus; returns the result
/// together with `R² mod N` so the caller can pass it back in as
/// `cached_r2` on a later call against the same modulus, skipping the
/// one-time cost of computing it.
pub fn mod_exp(
    base: &Bignum,
    exp: &Bignum,
    modulus: &Bignum,
    cached_r2: Option<&Bignum>,
) -> Result<(Bignum, Bignum), BignumError> {
    if modulus.is_negative() || modulus.is_zero() {
        return Err(BignumError::NegativeModulus);
    }
    if modulus.is_even() {
        return Err(BignumError::EvenModulus);
    }

    let r_bits = modulus.limb_count() * 32;
    let r = Bignum::from_u64(1).shl(r_bits);

    let r2 = match cached_r2 {
        Some(v) => v.clone(),
        None => modulo(&r.mul(&r), modulus)?,
    };

    // n_inv = -N^-1 mod R. N is odd and R is a power of two, so N is
    // always invertible mod R.
    let n_mod_r = modulo(modulus, &r)?;
    let n_inv_pos = mod_inverse(&n_mod_r, &r)?;
    let n_inv = r.sub(&n_inv_pos);

    let montmul = |a: &Bignum, b: &Bignum| -> Result<Bignum, BignumError> {
        let t = a.mul(b);
        let m = modulo(&t, &r)?.mul(&n_inv);
        let m = modulo(&m, &r)?;
        let u = t.add(&m.mul(modulus)).shr(r_bits);
        if u.cmp_abs(modulus) != Ordering::Less {
            Ok(u.sub(modulus))
        } else {
            Ok(u)
        }
    };

    let bits = exp.bit_length();
    if bits == 0 {
        // A^0 = 1, independent of A.
        return Ok((modulo(&Bignum::from_u64(1), modulus)?, r2));
    }

    let wsize: usize = if bits > 671 {
        6
    } else if bits > 239 {
        5
    } else if bits > 79 {
        4
    } else if bits > 23 {
        3
    } else {
        1
    };

    let base_mod = if base.cmp_abs(modulus) != Ordering::Less {
        modulo(base, modulus)?
    } else {
        base.abs()
    };
    let base_mont = montmul(&base_mod, &r2)?;

    // Odd powers of the base in Montgomery form: table[i] holds
    // base_mont^(2*i + 1).
    let table_len = 1usize << (wsize - 1);
    let mut table = Vec::with_capacity(table_len);
    table.push(base_mont.clone());
    if table_len > 1 {
        let base_sq = montmul(&base_mont, &base_mont)?;
        for i in 1..table_len {
            let next = montmul(&table[i - 1], &base_sq)?;
            table.push(next);
        }
    }

    // Accumulator starts as the Montgomery form of 1, i.e. R mod N.
    let mut acc = modulo(&r, modulus)?;

    let mut i: i64 = bits as i64 - 1;
    while i >= 0 {
        if exp.get_bit(i as usize) == 0 {
            acc = montmul(&acc, &acc)?;
            i -= 1;
            continue;
        }

        // Extend the window down from i one bit at a time, stopping at
        // wsize or as soon as the next bit down is zero. This never
        // leaves a zero as the window's low bit (which would make the
        // window value even and misindex the odd-power table), at the
        // cost of sometimes picking a shorter window than the classic
        // algorithm would — still correct, just occasionally more
        // squarings than strictly necessary.
        let mut l = 1usize;
        while l < wsize && i as usize >= l && exp.get_bit(i as usize - l) != 0 {
            l += 1;
        }

        let mut value: u64 = 0;
        for b in 0..l {
            value = (value << 1) | exp.get_bit(i as usize - b) as u64;
        }

        for _ in 0..l {
            acc = montmul(&acc, &acc)?;
        }
        acc = montmul(&acc, &table[((value - 1) / 2) as usize])?;

        i -= l as i64;
    }

    // Reduce out of Montgomery form: REDC(acc) = acc * R^-1 mod N.
    let result = montmul(&acc, &Bignum::from_u64(1))?;
    Ok((result, r2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_known_value() {
        let (result, _) = mod_exp(
            &Bignum::from_u64(3),
            &Bignum::from_u64(5),
            &Bignum::from_u64(7),
            None,
        )
        .unwrap();
        assert_eq!(result.to_u64(), Some(5));
    }

    #[test]
    fn exponent_zero_is_one() {
        let (result, _) = mod_exp(
            &Bignum::from_u64(123_456),
            &Bignum::zero(),
            &Bignum::from_u64(97),
            None,
        )
        .unwrap();
        assert_eq!(result.to_u64(), Some(1));
    }

    #[test]
    fn even_modulus_is_rejected() {
        assert_eq!(
            mod_exp(
                &Bignum::from_u64(3),
                &Bignum::from_u64(5),
                &Bignum::from_u64(8),
                None
            ),
            Err(BignumError::EvenModulus)
        );
    }

    #[test]
    fn negative_modulus_is_rejected() {
        assert_eq!(
            mod_exp(
                &Bignum::from_u64(3),
                &Bignum::from_u64(5),
                &Bignum::from_i64(-7),
                None
            ),
            Err(BignumError::NegativeModulus)
        );
    }

    #[test]
    fn matches_repeated_multiplication_modulo() {
        let base = Bignum::from_u64(17);
        let modulus = Bignum::from_u64(1_000_003);
        let mut expected = Bignum::from_u64(1);
        for _ in 0..13 {
            expected = modulo(&expected.mul(&base), &modulus).unwrap();
        }
        let (result, _) = mod_exp(&base, &Bignum::from_u64(13), &modulus, None).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn large_operands_with_cached_r_squared() {
        let base = Bignum::read_string(16, &"ab".repeat(40)).unwrap();
        let exp = Bignum::read_string(16, "10001").unwrap();
        let modulus = Bignum::read_string(10, "1000000000000000000000000000000000057").unwrap();
        assert!(!modulus.is_even());

        let (first, r2) = mod_exp(&base, &exp, &modulus, None).unwrap();
        let (second, _) = mod_exp(&base, &exp, &modulus, Some(&r2)).unwrap();
        assert_eq!(first, second);
        assert!(first.cmp_abs(&modulus) == Ordering::Less);
    }

    #[test]
    fn sliding_window_size_selection_covers_all_branches() {
        // Exercise each window-size branch via exponent bit length.
        for exp_bits in [10u32, 50, 100, 300, 700] {
            let exp = Bignum::from_u64(1).shl(exp_bits as usize - 1);
            let (result, _) =
                mod_exp(&Bignum::from_u64(5), &exp, &Bignum::from_u64(1_000_003), None).unwrap();
            assert!(result.cmp_abs(&Bignum::from_u64(1_000_003)) == Ordering::Less);
        }
    }
}
