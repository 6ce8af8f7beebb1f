//! HMAC-DRBG, HMAC-SHA-512 (§4.G, SP 800-90A §10.1.2).

use zeroize::Zeroize;

use crate::drbg::{Drbg, DrbgError};
use crate::primitives::hash::hmac_sha512_concat;

/// DRBG seed length in bytes for HMAC-SHA-512.
pub const SEEDLEN: usize = 64;
/// Maximum output bytes per `generate` call.
pub const MAX_BYTES_PER_REQUEST: usize = 1 << 16;
/// Maximum `reseed_counter` before `generate` must fail with `ReseedRequired`.
pub const RESEED_INTERVAL: u64 = 1 << 48;

/// HMAC-DRBG internal state.
#[derive(Zeroize)]
pub struct HmacDrbg {
    k: [u8; SEEDLEN],
    v: [u8; SEEDLEN],
    #[zeroize(skip)]
    reseed_counter: u64,
    #[zeroize(skip)]
    instantiated: bool,
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl HmacDrbg {
    /// A freshly constructed, uninstantiated HMAC-DRBG.
    pub fn new() -> Self {
        Self {
            k: [0u8; SEEDLEN],
            v: [0u8; SEEDLEN],
            reseed_counter: 0,
            instantiated: false,
        }
    }

    /// `update(data?)` — HMAC_DRBG_Update per SP 800-90A §10.1.2.2.
    fn update(&mut self, data: &[u8]) {
        self.k = hmac_sha512_concat(&self.k, &[&self.v, &[0x00], data]);
        self.v = hmac_sha512_concat(&self.k, &[&self.v]);

        if !data.is_empty() {
            self.k = hmac_sha512_concat(&self.k, &[&self.v, &[0x01], data]);
            self.v = hmac_sha512_concat(&self.k, &[&self.v]);
        }
    }

    /// `instantiate(entropy, nonce, pers?)`.
    pub fn instantiate(
        &mut self,
        entropy: &[u8],
        nonce: &[u8],
        personalization: Option<&[u8]>,
    ) -> Result<(), DrbgError> {
        self.k = [0u8; SEEDLEN];
        self.v = [1u8; SEEDLEN];

        let mut seed_material = Vec::with_capacity(entropy.len() + nonce.len() + SEEDLEN);
        seed_material.extend_from_slice(entropy);
        seed_material.extend_from_slice(nonce);
        if let Some(p) = personalization {
            seed_material.extend_from_slice(p);
        }
        self.update(&seed_material);
        self.reseed_counter = 1;
        self.instantiated = true;

        seed_material.zeroize();
        Ok(())
    }

    /// `reseed(entropy, ai?)`.
    pub fn reseed_hmac(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        if !self.instantiated {
            return Err(DrbgError::NotInstantiated);
        }
        let mut seed_material = Vec::with_capacity(entropy.len() + SEEDLEN);
        seed_material.extend_from_slice(entropy);
        if let Some(ai) = additional_input {
            seed_material.extend_from_slice(ai);
        }
        self.update(&seed_material);
        self.reseed_counter = 1;
        seed_material.zeroize();
        Ok(())
    }

    /// `generate(out, len, ai?)`.
    pub fn generate_hmac(&mut self, out: &mut [u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
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
                self.update(ai);
            }
        }

        let mut written = 0;
        while written < out.len() {
            self.v = hmac_sha512_concat(&self.k, &[&self.v]);
            let n = (out.len() - written).min(SEEDLEN);
            out[written..written + n].copy_from_slice(&self.v[..n]);
            written += n;
        }

        self.update(additional_input.unwrap_or(&[]));
        self.reseed_counter += 1;
        Ok(())
    }

    /// `clear()` / `uninstantiate()`.
    pub fn uninstantiate_hmac(&mut self) {
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

impl Default for HmacDrbg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drbg for HmacDrbg {
    fn reseed(&mut self, entropy: &[u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        self.reseed_hmac(entropy, additional_input)
    }

    fn generate(&mut self, out: &mut [u8], additional_input: Option<&[u8]>) -> Result<(), DrbgError> {
        self.generate_hmac(out, additional_input)
    }

    fn uninstantiate(&mut self) {
        self.uninstantiate_hmac();
    }
}
