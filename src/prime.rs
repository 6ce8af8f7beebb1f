//! Probabilistic primality testing and probable-prime generation (§4.J),
//! built on [`crate::bignum`] and driven by any [`Drbg`](crate::drbg::Drbg).
//!
//! Two entry points: [`is_probable_prime`] runs FIPS 186-5 B.3.1
//! Miller-Rabin, and [`generate_probable_prime`] samples and sieves
//! candidates [HAC 4.44] until one survives trial division and
//! Miller-Rabin, optionally in the "safe prime" form where both `X` and
//! `(X-1)/2` are probable primes.

use once_cell::sync::Lazy;

use crate::bignum::{mod_exp, Bignum};
use crate::drbg::Drbg;
use crate::error::BignumError;

/// Small-prime sieve used for trial division, generated at first use via
/// trial division rather than embedded as a literal table (§9: avoid
/// carrying a 1024-entry magic constant array when the crate can derive
/// it cheaply and correctly at startup).
static SMALL_PRIMES: Lazy<Vec<u32>> = Lazy::new(|| sieve_primes(1024));

fn sieve_primes(count: usize) -> Vec<u32> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = 2u32;
    while primes.len() < count {
        if primes.iter().all(|&p| candidate % p != 0) {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// How many leading small primes to trial-divide by before the
/// Miller-Rabin rounds, by candidate bit length (§4.J).
fn num_trial_divisions(nbits: usize) -> usize {
    if nbits <= 512 {
        128
    } else if nbits <= 1024 {
        256
    } else if nbits <= 2048 {
        512
    } else {
        1024
    }
}

/// How many Miller-Rabin rounds give a false-positive rate of `2^-80`
/// [HAC Table 4.4], by candidate bit length.
fn miller_rabin_rounds(nbits: usize) -> usize {
    if nbits >= 1300 {
        2
    } else if nbits >= 850 {
        3
    } else if nbits >= 550 {
        5
    } else if nbits >= 350 {
        8
    } else if nbits >= 250 {
        12
    } else if nbits >= 150 {
        18
    } else {
        27
    }
}

/// Miller-Rabin probable-primality test [FIPS 186-5 B.3.1].
///
/// `iter` rounds are run; each draws a base `b` of `w`'s bit length from
/// `rng`, normalized to exactly that many bits and resampled until it
/// falls in `[2, w-2]`. Returns `Ok(true)` if `w` survives every round,
/// `Ok(false)` as soon as one round witnesses compositeness.
pub fn is_probable_prime(w: &Bignum, iter: usize, rng: &mut dyn Drbg) -> Result<bool, BignumError> {
    if w.cmp_abs(&Bignum::from_u64(3)) == std::cmp::Ordering::Less {
        return Ok(false);
    }
    if w.is_even() {
        return Ok(false);
    }

    let w_minus_1 = w.sub(&Bignum::from_u64(1));

    // Largest `a` such that 2^a divides w-1.
    let mut a = 0usize;
    let mut m = w_minus_1.clone();
    while m.is_even() && !m.is_zero() {
        m = m.shr(1);
        a += 1;
    }

    let wlen = w.bit_length();
    let byte_len = (wlen + 7) / 8;
    let mut r2_cache: Option<Bignum> = None;

    'rounds: for _ in 0..iter {
        let b = loop {
            let mut buf = vec![0u8; byte_len];
            rng.generate(&mut buf, None)
                .map_err(|_| BignumError::RngFailure)?;
            let mut candidate = Bignum::from_bytes_be(&buf);

            let blen = candidate.bit_length();
            if wlen > blen {
                candidate = candidate.shl(wlen - blen);
            } else if blen > wlen {
                candidate = candidate.shr(blen - wlen);
            }

            if candidate.cmp_abs(&Bignum::from_u64(2)) != std::cmp::Ordering::Less
                && candidate.cmp_abs(&w_minus_1) == std::cmp::Ordering::Less
            {
                break candidate;
            }
        };

        let (mut z, r2) = mod_exp(&b, &m, w, r2_cache.as_ref())?;
        r2_cache = Some(r2);

        if z.cmp_abs(&Bignum::from_u64(1)) == std::cmp::Ordering::Equal
            || z.cmp_abs(&w_minus_1) == std::cmp::Ordering::Equal
        {
            continue 'rounds;
        }

        let mut witnessed_composite = true;
        for _ in 1..a {
            let (squared, r2) = mod_exp(&z, &Bignum::from_u64(2), w, Some(&r2))?;
            z = squared;
            r2_cache = Some(r2);

            if z.cmp_abs(&Bignum::from_u64(1)) == std::cmp::Ordering::Equal {
                return Ok(false);
            }
            if z.cmp_abs(&w_minus_1) == std::cmp::Ordering::Equal {
                witnessed_composite = false;
                break;
            }
        }

        if witnessed_composite {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Sample an `nbits`-long probable prime [HAC 4.44]. When `safe_prime` is
/// set, both the returned `X` and `(X-1)/2` are probable primes.
pub fn generate_probable_prime(
    nbits: usize,
    safe_prime: bool,
    rng: &mut dyn Drbg,
) -> Result<Bignum, BignumError> {
    if nbits < 32 {
        return Err(BignumError::InvalidDigit);
    }

    let t1 = num_trial_divisions(nbits);
    let t2 = miller_rabin_rounds(nbits);
    let byte_len = (nbits + 7) / 8;

    'generate: loop {
        let mut buf = vec![0u8; byte_len];
        rng.generate(&mut buf, None)
            .map_err(|_| BignumError::RngFailure)?;
        let mut x = Bignum::from_bytes_be(&buf);

        let j = x.bit_length();
        if j < nbits {
            x = x.shl(nbits - j);
        } else if j > nbits {
            x = x.shr(j - nbits);
        }
        x = x.set_low_bit(0);

        if !safe_prime {
            loop {
                if !passes_trial_division(&x, t1) {
                    x = x.add(&Bignum::from_u64(2));
                    continue;
                }
                if is_probable_prime(&x, t2, rng)? {
                    break;
                }
                x = x.add(&Bignum::from_u64(2));
            }

            if x.bit_length() != nbits {
                continue 'generate;
            }
            return Ok(x);
        }

        // Safe-prime mode: keep X = 3 (mod 4), X = 2 (mod 3), and track
        // Y = (X-1)/2 alongside it so both can be tested without
        // recomputing the shift every round. X is already odd from the
        // unconditional set_low_bit(0) above; setting bit 1 too makes
        // it 3 (mod 4).
        x = x.set_low_bit(1);
        let r = modulo_small(&x, 3);
        if r == 0 {
            x = x.add(&Bignum::from_u64(8));
        } else if r == 1 {
            x = x.add(&Bignum::from_u64(4));
        }

        let mut y = x.shr(1);

        loop {
            if passes_trial_division(&x, t1) && passes_trial_division(&y, t1) {
                if is_probable_prime(&x, t2, rng)? && is_probable_prime(&y, t2, rng)? {
                    break;
                }
            }
            x = x.add(&Bignum::from_u64(12));
            y = y.add(&Bignum::from_u64(6));
        }

        if x.bit_length() != nbits {
            continue 'generate;
        }
        return Ok(x);
    }
}

fn passes_trial_division(x: &Bignum, t1: usize) -> bool {
    for &p in SMALL_PRIMES.iter().take(t1) {
        let p_bn = Bignum::from_u64(p as u64);
        if x.cmp_abs(&p_bn) == std::cmp::Ordering::Less
            || x.cmp_abs(&p_bn) == std::cmp::Ordering::Equal
        {
            continue;
        }
        if modulo_small(x, p) == 0 {
            return false;
        }
    }
    true
}

fn modulo_small(x: &Bignum, divisor: u32) -> u32 {
    crate::bignum::modulo(x, &Bignum::from_u64(divisor as u64))
        .expect("divisor is a nonzero small prime")
        .to_u64()
        .unwrap_or(0) as u32
}
