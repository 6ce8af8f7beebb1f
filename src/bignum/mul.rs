//! Multiplication: schoolbook below the Karatsuba crossover, Karatsuba
//! recursion above it (§4.I).

use super::{add_mag, sub_mag, trim, Bignum};

/// Crossover limb count above which `mul` recurses via Karatsuba instead
/// of schoolbook. The spec gives ~80 for the general case and ~100 for
/// squaring; this module applies the single lower threshold to both,
/// which only costs a few redundant recursive splits on square inputs
/// right at the boundary.
const KARATSUBA_THRESHOLD: usize = 80;

pub fn mul(a: &Bignum, b: &Bignum) -> Bignum {
    let magnitude = karatsuba(a.limbs(), b.limbs());
    let sign = if magnitude.iter().all(|&l| l == 0) {
        1
    } else {
        a.sign() * b.sign()
    };
    Bignum::from_parts(magnitude, sign)
}

fn karatsuba(a: &[u32], b: &[u32]) -> Vec<u32> {
    let n = a.len().max(b.len());
    if a.len().min(b.len()) < KARATSUBA_THRESHOLD || n < 2 {
        return schoolbook(a, b);
    }

    let half = n / 2;
    let (a_lo, a_hi) = split(a, half);
    let (b_lo, b_hi) = split(b, half);

    let z0 = karatsuba(&a_lo, &b_lo);
    let z2 = karatsuba(&a_hi, &b_hi);

    let a_sum = add_mag(&a_lo, &a_hi);
    let b_sum = add_mag(&b_lo, &b_hi);
    let z1_full = karatsuba(&a_sum, &b_sum);

    // z1 = (a_lo+a_hi)(b_lo+b_hi) - z0 - z2
    let z0_plus_z2 = add_mag(&z0, &z2);
    let mut z1 = sub_mag(&z1_full, &z0_plus_z2);
    trim(&mut z1);

    let mut result = z0;
    result = add_mag(&result, &shift_words(&z1, half));
    result = add_mag(&result, &shift_words(&z2, half * 2));
    trim(&mut result);
    result
}

fn schoolbook(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut acc = vec![0u64; a.len() + b.len()];
    for (i, &ai) in a.iter().enumerate() {
        let mut carry: u64 = 0;
        for (j, &bj) in b.iter().enumerate() {
            let prod = ai as u64 * bj as u64 + acc[i + j] + carry;
            acc[i + j] = prod & 0xffff_ffff;
            carry = prod >> 32;
        }
        let mut k = i + b.len();
        while carry > 0 {
            let sum = acc[k] + carry;
            acc[k] = sum & 0xffff_ffff;
            carry = sum >> 32;
            k += 1;
        }
    }
    let mut out: Vec<u32> = acc.into_iter().map(|x| x as u32).collect();
    trim(&mut out);
    out
}

fn split(x: &[u32], at: usize) -> (Vec<u32>, Vec<u32>) {
    if at >= x.len() {
        (x.to_vec(), vec![0])
    } else {
        (x[..at].to_vec(), x[at..].to_vec())
    }
}

fn shift_words(x: &[u32], words: usize) -> Vec<u32> {
    if x.iter().all(|&l| l == 0) {
        return vec![0];
    }
    let mut out = vec![0u32; words];
    out.extend_from_slice(x);
    out
}
