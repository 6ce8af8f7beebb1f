//! Division and modulo by Knuth Algorithm D (§4.I).
//!
//! Ported at the level of the algorithm's structure (normalize, estimate
//! a quotient digit from the divisor's top two limbs, correct it against
//! a three-limb comparison, multiply-subtract with an add-back on
//! overshoot) rather than line-for-line from the source's raw limb-index
//! bookkeeping — the digit-at-a-time steps are expressed as calls into
//! this module's own `add`/`sub`/`mul`/`shl`/`cmp_abs`, which keeps the
//! arithmetic itself exercised by the same code path the rest of the
//! crate already tests.

use std::cmp::Ordering;

use super::Bignum;
use crate::error::BignumError;

/// `A / B` and `A mod B` together. The remainder is always in `[0, |B|)`
/// (§3's pool-unrelated invariant, §8's boundary property); the quotient
/// carries `sign(A) * sign(B)`.
pub fn div_mod(a: &Bignum, b: &Bignum) -> Result<(Bignum, Bignum), BignumError> {
    if b.is_zero() {
        return Err(BignumError::DivisionByZero);
    }
    let (q_mag, r_mag) = divmod_magnitude(&a.abs(), &b.abs());
    let q = Bignum::from_parts(q_mag.limbs().to_vec(), a.sign() * b.sign());
    let r = Bignum::from_parts(r_mag.limbs().to_vec(), 1);
    Ok((q, r))
}

/// `A mod B`, in `[0, |B|)`.
pub fn modulo(a: &Bignum, b: &Bignum) -> Result<Bignum, BignumError> {
    Ok(div_mod(a, b)?.1)
}

/// Divide two non-negative magnitudes, returning `(quotient, remainder)`.
fn divmod_magnitude(a: &Bignum, b: &Bignum) -> (Bignum, Bignum) {
    let mut a = a.clone();
    a.shrink(1);
    let mut b = b.clone();
    b.shrink(1);

    if a.cmp_abs(&b) == Ordering::Less {
        return (Bignum::zero(), a);
    }

    let shift = b.limbs().last().copied().unwrap_or(0).leading_zeros() as usize;
    let y = b.shl(shift);
    let mut x = a.shl(shift);

    let n = x.limb_count() - 1;
    let t = y.limb_count() - 1;

    let mut q = Bignum::zero();

    // Top digit, at word position (n - t): repeated subtraction, bounded
    // by a small constant given the normalization above.
    let top_aligned = y.shl((n - t) * 32);
    let mut top_digit: u64 = 0;
    while x.cmp_abs(&top_aligned) != Ordering::Less {
        x = x.sub(&top_aligned);
        top_digit += 1;
    }
    if top_digit > 0 {
        q = q.add(&Bignum::from_u64(top_digit).shl((n - t) * 32));
    }

    for i in (t + 1..=n).rev() {
        let pos = i - t - 1;

        let top2 = ((x.limb_at(i) as u64) << 32) | x.limb_at(i - 1) as u64;
        let y_top = y.limb_at(t) as u64;
        let mut qhat = (top2 / y_top).min(0xffff_ffff);

        let y01 = Bignum::from_parts(vec![if t >= 1 { y.limb_at(t - 1) } else { 0 }, y.limb_at(t)], 1);
        let x012 = Bignum::from_parts(
            vec![
                if i >= 2 { x.limb_at(i - 2) } else { 0 },
                if i >= 1 { x.limb_at(i - 1) } else { 0 },
                x.limb_at(i),
            ],
            1,
        );
        while qhat > 0 && y01.mul(&Bignum::from_u64(qhat)).cmp_abs(&x012) == Ordering::Greater {
            qhat -= 1;
        }

        let subtrahend = y.mul(&Bignum::from_u64(qhat)).shl(pos * 32);
        if x.cmp_abs(&subtrahend) == Ordering::Less {
            qhat -= 1;
            let corrected = y.mul(&Bignum::from_u64(qhat)).shl(pos * 32);
            x = x.sub(&corrected);
        } else {
            x = x.sub(&subtrahend);
        }

        if qhat > 0 {
            q = q.add(&Bignum::from_u64(qhat).shl(pos * 32));
        }
    }

    let r = x.shr(shift);
    (q, r)
}
