//! CTR-DRBG, AES-256, no derivation function (§4.E, SP 800-90A §10.2).

use zeroize::Zeroize;

use crate::drbg::{Drbg, DrbgError};
use crate::primitives::aes256;

/// DRBG seed length in bytes.
pub const SEEDLEN: usize = 48;
/// AES block size in bytes.
pub const OUTLEN: usize = 16;
/// Maximum output bytes per `generate` call: `2^16`.
pub const MAX_BYTES_PER_REQUEST: usize = 1 << 16;
/// Maximum `reseed_counter` before `generate` must fail with `ReseedRequired`: `2^48`.
pub const RESEED_INTERVAL: u64 = 1 << 48;

/// CTR-DRBG internal state.
#[derive(Zeroize)]
pub struct CtrDrbg {
    k: [u8; 32],
    v: [u8; OUTLEN],
    #[zeroize(skip)]
    reseed_counter: u64,
    #[zeroize(skip)]
    instantiated: bool,
}

impl Drop for CtrDrbg {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl CtrDrbg {
    /// A freshly constructed, uninstantiated CTR-DRBG.
    pub fn new() -> Self {
        Self {
            k: [0u8; 32],
            v: [0u8; OUTLEN],
            reseed_counter: 0,
            instantiated: false,
        }
    }

    /// `instantiate(entropy[48], personalization?)`.
    pub fn instantiate(
        &mut self,
        entropy: &[u8; SEEDLEN],
        personalization: Option<&[u8]>,
    ) -> Result<(), DrbgError> {
        if let Some(p) = personalization {
            if p.len() > SEEDLEN {
                return Err(DrbgError::BadArguments);
            }
        }

        self.k = [0u8; 32];
        self.v = [0u8; OUTLEN];

        let mut seed = *entropy;
        if let Some(p) = personalization {
            for (s, b) in seed.iter_mut().zip(p.iter()) {
                *s ^= b;
            }
        }

        self.update(&seed);
        self.reseed_counter = 1;
        self.instantiated = true;

        seed.zeroize();
        Ok(())
    }

    /// `update(data[<=48])` — CTR_DRBG_Update per SP 800-90A §10.2.1.2.
    fn update(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= SEEDLEN);
        let schedule = aes256::expand(&self.k);
        let mut temp = [0u8; SEEDLEN];
        for block in temp.chunks_mut(OUTLEN) {
            increment_counter(&mut self.v);
            let out = aes256::encrypt_block(&schedule, &self.v);
            block.copy_from_slice(&out);
        }
        for (t, d) in temp.iter_mut().zip(data.iter()) {
            *t ^= d;
        }
        self.k.copy_from_slice(&temp[..32]);
        self.v.copy_from_slice(&temp[32..48]);
        temp.zeroize();
    }

    /// `reseed(entropy[48], ai?)`.
    pub fn reseed_ctr(
        &mut self,
        entropy: &[u8; SEEDLEN],
        additional_input: Option<&[u8]>,
    ) -> Result<(), DrbgError> {
        if !self.instantiated {
            return Err(DrbgError::NotInstantiated);
        }
        if let Some(ai) = additional_input {
            if ai.len() > SEEDLEN {
                return Err(DrbgError::BadArguments);
            }
        }
        let mut seed = *entropy;
        if let Some(ai) = additional_input {
            for (s, b) in seed.iter_mut().zip(ai.iter()) {
                *s ^= b;
            }
        }
        self.update(&seed);
        self.reseed_counter = 1;
        seed.zeroize();
        Ok(())
    }

    /// `generate(out, len, ai?)`.
    pub fn generate_ctr(
        &mut self,
        out: &mut [u8],
        additional_input: Option<&[u8]>,
    ) -> Result<(), DrbgError> {
        if !self.instantiated {
            return Err(DrbgError::NotInstantiated);
        }
        if out.len() > MAX_BYTES_PER_REQUEST {
            return Err(DrbgError::BadArguments);
        }
        if let Some(ai) = additional_input {
            if ai.len() > SEEDLEN {
                return Err(DrbgError::BadArguments);
            }
        }
        if self.reseed_counter > RESEED_INTERVAL {
            return Err(DrbgError::ReseedRequired);
        }

        if let Some(ai) = additional_input {
            if !ai.is_empty() {
                self.update(ai);
            }
        }

        let schedule = aes256::expand(&self.k);
        let mut written = 0;
        while written < out.len() {
            increment_counter(&mut self.v);
            let block = aes256::encrypt_block(&schedule, &self.v);
            let n = (out.len() - written).min(OUTLEN);
            out[written..written + n].copy_from_slice(&block[..n]);
            written += n;
        }

        // Backtracking resistance: update with the same `ai` (or a
        // zero-length input) that was used above. SP 800-90A calls for
        // passing the identical additional input here; the source's
        // alternate zero-padded codepath is the Open Question §9 resolves
        // against.
        self.update(additional_input.unwrap_or(&[]));

        self.reseed_counter += 1;
        Ok(())
    }

    /// `uninstantiate()`.
    pub fn uninstantiate_ctr(&mut self) {
        self.zeroize();
        self.instantiated = false;
        self.reseed_counter = 0;
    }

    /// Whether `instantiate` has been called and `uninstantiate` has not.
    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    /// Current reseed counter, for diagnostics and the §8 boundary tests.
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }
}

impl Default for CtrDrbg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for CtrDrbg {
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        if entropy.len() != SEEDLEN {
            return Err(DrbgError::BadArguments);
        }
        let mut buf = [0u8; SEEDLEN];
        buf.copy_from_slice(entropy);
        let r = self.reseed_ctr(&buf, additional_input);
        buf.zeroize();
        r
    }

    fn generate(&mut self, out: &mut [u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        self.generate_ctr(out, additional_input)
    }

    fn uninstantiate(&mut self) {
        self.uninstantiate_ctr();
    }
}

/// Increment the low 32-bit big-endian word of `V`, wrapping modulo `2^32`,
/// leaving the remaining 12 bytes untouched — per §3's data model ("V: 16
/// bytes (big-endian counter in the low 4 bytes)").
fn increment_counter(v: &mut [u8; OUTLEN]) {
    let mut low = u32::from_be_bytes([v[12], v[13], v[14], v[15]]);
    low = low.wrapping_add(1);
    v[12..16].copy_from_slice(&low.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entropy_seed(byte: u8) -> [u8; SEEDLEN] {
        [byte; SEEDLEN]
    }

    #[test]
    fn generate_requires_instantiate() {
        let mut drbg = CtrDrbg::new();
        let mut out = [0u8; 16];
        assert_eq!(
            drbg.generate_ctr(&mut out, None),
            Err(DrbgError::NotInstantiated)
        );
    }

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = CtrDrbg::new();
        let mut b = CtrDrbg::new();
        a.instantiate(&entropy_seed(0x42), None).unwrap();
        b.instantiate(&entropy_seed(0x42), None).unwrap();

        let mut out_a = [0u8; 64];
        let mut out_b = [0u8; 64];
        a.generate_ctr(&mut out_a, None).unwrap();
        b.generate_ctr(&mut out_b, None).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn backtracking_resistance_changes_state() {
        let mut drbg = CtrDrbg::new();
        drbg.instantiate(&entropy_seed(0x7), None).unwrap();

        let mut first = [0u8; 32];
        drbg.generate_ctr(&mut first, None).unwrap();
        let mut second = [0u8; 32];
        drbg.generate_ctr(&mut second, None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn zero_length_generate_is_noop_but_advances_counter() {
        let mut drbg = CtrDrbg::new();
        drbg.instantiate(&entropy_seed(0x9), None).unwrap();
        let before = drbg.reseed_counter();
        drbg.generate_ctr(&mut [], None).unwrap();
        assert_eq!(drbg.reseed_counter(), before + 1);
    }

    #[test]
    fn request_too_large_rejected() {
        let mut drbg = CtrDrbg::new();
        drbg.instantiate(&entropy_seed(0x1), None).unwrap();
        let mut out = vec![0u8; MAX_BYTES_PER_REQUEST + 1];
        assert_eq!(
            drbg.generate_ctr(&mut out, None),
            Err(DrbgError::BadArguments)
        );
    }

    #[test]
    fn reseed_required_once_counter_exceeds_interval() {
        let mut drbg = CtrDrbg::new();
        drbg.instantiate(&entropy_seed(0x3), None).unwrap();
        drbg.reseed_counter = RESEED_INTERVAL + 1;
        let mut out = [0u8; 16];
        assert_eq!(
            drbg.generate_ctr(&mut out, None),
            Err(DrbgError::ReseedRequired)
        );
    }

    #[test]
    fn reseed_resets_counter() {
        let mut drbg = CtrDrbg::new();
        drbg.instantiate(&entropy_seed(0x5), None).unwrap();
        let mut out = [0u8; 16];
        drbg.generate_ctr(&mut out, None).unwrap();
        drbg.generate_ctr(&mut out, None).unwrap();
        assert!(drbg.reseed_counter() > 1);
        drbg.reseed_ctr(&entropy_seed(0x6), None).unwrap();
        assert_eq!(drbg.reseed_counter(), 1);
    }
}
