//! Hash-DRBG, SHA-512 (§4.F, SP 800-90A §10.1.1).

use zeroize::Zeroize;

use crate::drbg::{Drbg, DrbgError};
use crate::primitives::hash::{sha512, sha512_concat, SHA512_LEN};

/// DRBG seed length in bytes for SHA-512 (SP 800-90A Table 2).
pub const SEEDLEN: usize = 111;
/// Maximum output bytes per `generate` call.
pub const MAX_BYTES_PER_REQUEST: usize = 1 << 16;
/// Maximum `reseed_counter` before `generate` must fail with `ReseedRequired`.
pub const RESEED_INTERVAL: u64 = 1 << 48;
/// `Hash_df`'s hard cap on requested output length: `255 * 64`.
pub const HASH_DF_MAX_OUTLEN: usize = 255 * SHA512_LEN;

/// Hash-DRBG internal state.
#[derive(Zeroize)]
pub struct HashDrbg {
    v: [u8; SEEDLEN],
    c: [u8; SEEDLEN],
    #[zeroize(skip)]
    reseed_counter: u64,
    #[zeroize(skip)]
    instantiated: bool,
}

impl Drop for HashDrbg {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl HashDrbg {
    /// A freshly constructed, uninstantiated Hash-DRBG.
    pub fn new() -> Self {
        Self {
            v: [0u8; SEEDLEN],
            c: [0u8; SEEDLEN],
            reseed_counter: 0,
            instantiated: false,
        }
    }

    /// `Hash_df(input, outlen)` — the entropy-conditioning derivation
    /// function (§4.F, GLOSSARY). Rejects `outlen > 255*64`.
    pub fn hash_df(input: &[u8], outlen: usize) -> Result<Vec<u8>, DrbgError> {
        if outlen > HASH_DF_MAX_OUTLEN {
            return Err(DrbgError::BadArguments);
        }
        let mut out = Vec::with_capacity(outlen.div_ceil(SHA512_LEN) * SHA512_LEN);
        let bitlen = ((outlen * 8) as u32).to_be_bytes();
        let mut counter: u8 = 1;
        while out.len() < outlen {
            let digest = sha512_concat(&[&[counter], &bitlen, input]);
            out.extend_from_slice(&digest);
            counter = counter.wrapping_add(1);
        }
        out.truncate(outlen);
        Ok(out)
    }

    /// `instantiate(entropy, nonce, pers?)`.
    pub fn instantiate(
        &mut self,
        entropy: &[u8],
        nonce: &[u8],
        personalization: Option<&[u8]>,
    ) -> Result<(), DrbgError> {
        let mut seed_material = Vec::with_capacity(entropy.len() + nonce.len() + SEEDLEN);
        seed_material.extend_from_slice(entropy);
        seed_material.extend_from_slice(nonce);
        if let Some(p) = personalization {
            seed_material.extend_from_slice(p);
        }

        let v = Self::hash_df(&seed_material, SEEDLEN)?;
        self.v.copy_from_slice(&v);

        let mut c_input = Vec::with_capacity(1 + SEEDLEN);
        c_input.push(0x00);
        c_input.extend_from_slice(&self.v);
        let c = Self::hash_df(&c_input, SEEDLEN)?;
        self.c.copy_from_slice(&c);

        self.reseed_counter = 1;
        self.instantiated = true;

        seed_material.zeroize();
        c_input.zeroize();
        Ok(())
    }

    /// `reseed(entropy, ai?)`.
    pub fn reseed_hash(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        if !self.instantiated {
            return Err(DrbgError::NotInstantiated);
        }
        let mut v_input = Vec::with_capacity(1 + SEEDLEN + entropy.len());
        v_input.push(0x01);
        v_input.extend_from_slice(&self.v);
        v_input.extend_from_slice(entropy);
        if let Some(ai) = additional_input {
            v_input.extend_from_slice(ai);
        }
        let v = Self::hash_df(&v_input, SEEDLEN)?;
        self.v.copy_from_slice(&v);

        let mut c_input = Vec::with_capacity(1 + SEEDLEN);
        c_input.push(0x00);
        c_input.extend_from_slice(&self.v);
        let c = Self::hash_df(&c_input, SEEDLEN)?;
        self.c.copy_from_slice(&c);

        self.reseed_counter = 1;
        v_input.zeroize();
        c_input.zeroize();
        Ok(())
    }

    /// `hashgen(len)` — output `len` bytes by iteratively hashing a working
    /// value starting at `V`, incrementing it mod `2^(111*8)` after each
    /// full 64-byte block.
    fn hashgen(&self, len: usize) -> Vec<u8> {
        let mut data = self.v;
        let mut out = Vec::with_capacity(len.div_ceil(SHA512_LEN) * SHA512_LEN);
        while out.len() < len {
            out.extend_from_slice(&sha512(&data));
            add_one_be(&mut data);
        }
        out.truncate(len);
        data.zeroize();
        out
    }

    /// `generate(out, len, ai?)`.
    pub fn generate_hash(&mut self, out: &mut [u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        if !self.instantiated {
            return Err(DrbgError::NotInstantiated);
        }
        if out.len() > MAX_BYTES_PER_REQUEST {
            return Err(DrbgError::BadArguments);
        }
        if self.reseed_counter > RESEED_INTERVAL {
            return Err(DrbgError::ReseedRequired);
        }

        if let Some(ai) = additional_input {
            if !ai.is_empty() {
                let w = sha512_concat(&[&[0x02], &self.v, ai]);
                add_be(&mut self.v, &w);
            }
        }

        let bytes = self.hashgen(out.len());
        out.copy_from_slice(&bytes);

        let h = sha512_concat(&[&[0x03], &self.v]);
        add_be(&mut self.v, &h);
        add_be(&mut self.v, &self.c);
        add_be(&mut self.v, &self.reseed_counter.to_be_bytes());

        self.reseed_counter += 1;
        Ok(())
    }

    /// `uninstantiate()`.
    pub fn uninstantiate_hash(&mut self) {
        self.zeroize();
        self.instantiated = false;
        self.reseed_counter = 0;
    }

    /// Whether `instantiate` has been called and `uninstantiate` has not.
    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    /// Current reseed counter.
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }
}

impl Default for HashDrbg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for HashDrbg {
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        self.reseed_hash(entropy, additional_input)
    }

    fn generate(&mut self, out: &mut [u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        self.generate_hash(out, additional_input)
    }

    fn uninstantiate(&mut self) {
        self.uninstantiate_hash();
    }
}

/// Add `b` (big-endian, right-aligned) into `a` (big-endian) modulo `2^(8*a.len())`.
fn add_be(a: &mut [u8; SEEDLEN], b: &[u8]) {
    let mut carry: u16 = 0;
    let mut bi = b.len();
    for ai in (0..a.len()).rev() {
        let bv = if bi > 0 {
            bi -= 1;
            b[bi] as u16
        } else {
            0
        };
        let sum = a[ai] as u16 + bv + carry;
        a[ai] = sum as u8;
        carry = sum >> 8;
    }
}

/// Add 1 to a big-endian value modulo `2^(8*len)`.
fn add_one_be(v: &mut [u8; SEEDLEN]) {
    for byte in v.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(byte: u8) -> Vec<u8> {
        vec![byte; SEEDLEN]
    }

    #[test]
    fn hash_df_rejects_outlen_over_cap() {
        assert_eq!(
            HashDrbg::hash_df(b"x", HASH_DF_MAX_OUTLEN + 1),
            Err(DrbgError::BadArguments)
        );
    }

    #[test]
    fn hash_df_produces_requested_length() {
        let out = HashDrbg::hash_df(b"seed material", 111).unwrap();
        assert_eq!(out.len(), 111);
    }

    #[test]
    fn hash_df_is_deterministic() {
        let a = HashDrbg::hash_df(b"same input", 200).unwrap();
        let b = HashDrbg::hash_df(b"same input", 200).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = HashDrbg::new();
        let mut b = HashDrbg::new();
        a.instantiate(&seed(0x11), b"nonce", None).unwrap();
        b.instantiate(&seed(0x11), b"nonce", None).unwrap();

        let mut out_a = [0u8; 80];
        let mut out_b = [0u8; 80];
        a.generate_hash(&mut out_a, None).unwrap();
        b.generate_hash(&mut out_b, None).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn backtracking_resistance_changes_state() {
        let mut drbg = HashDrbg::new();
        drbg.instantiate(&seed(0x22), b"nonce", None).unwrap();

        let mut first = [0u8; 32];
        drbg.generate_hash(&mut first, None).unwrap();
        let mut second = [0u8; 32];
        drbg.generate_hash(&mut second, None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn reseed_required_once_counter_exceeds_interval() {
        let mut drbg = HashDrbg::new();
        drbg.instantiate(&seed(0x33), b"nonce", None).unwrap();
        drbg.reseed_counter = RESEED_INTERVAL + 1;
        let mut out = [0u8; 16];
        assert_eq!(
            drbg.generate_hash(&mut out, None),
            Err(DrbgError::ReseedRequired)
        );
    }

    #[test]
    fn add_one_be_wraps_modulo_2_pow_n() {
        let mut v = [0xffu8; SEEDLEN];
        add_one_be(&mut v);
        assert_eq!(v, [0u8; SEEDLEN]);
    }

    #[test]
    fn reseed_resets_counter() {
        let mut drbg = HashDrbg::new();
        drbg.instantiate(&seed(0x44), b"nonce", None).unwrap();
        let mut out = [0u8; 16];
        drbg.generate_hash(&mut out, None).unwrap();
        assert!(drbg.reseed_counter() > 1);
        drbg.reseed_hash(&seed(0x55), None).unwrap();
        assert_eq!(drbg.reseed_counter(), 1);
    }
}
