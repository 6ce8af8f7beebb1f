//! AES-256 block primitive (§4.A), used by CTR-DRBG with no derivation function.
//!
//! Delegates key expansion and block encryption to the RustCrypto `aes`
//! crate, which selects hardware AES-NI/ARMv8 instructions when available
//! and falls back to constant-time bitsliced software otherwise — exactly
//! the side-channel posture §4.A asks for ("use constant-time tables or
//! hardware instructions; do not branch on key bytes").

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;

/// Expanded AES-256 round-key schedule.
pub struct Schedule(Aes256);

/// `expand(key[32]) -> schedule`.
pub fn expand(key: &[u8; 32]) -> Schedule {
    Schedule(Aes256::new(key.into()))
}

/// `encrypt_block(schedule, in[16]) -> out[16]`, the standard 14-round
/// AES-256 single-block encryption.
pub fn encrypt_block(schedule: &Schedule, input: &[u8; 16]) -> [u8; 16] {
    let mut block = aes::Block::clone_from_slice(input);
    schedule.0.encrypt_block(&mut block);
    let mut out = [0u8; 16];
    out.copy_from_slice(&block);
    out
}
