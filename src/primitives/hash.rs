//! SHA-512 and HMAC-SHA-512 primitives (§4.B).
//!
//! Delegates to the RustCrypto `sha2`/`hmac` crates rather than a
//! hand-rolled hash core; §4.B explicitly permits this ("Implementations
//! may delegate to a vetted library").

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha512};

/// SHA-512 digest length in bytes.
pub const SHA512_LEN: usize = 64;

/// Stateless `sha512(data) -> 64 bytes`.
pub fn sha512(data: &[u8]) -> [u8; SHA512_LEN] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut buf = [0u8; SHA512_LEN];
    buf.copy_from_slice(&out);
    buf
}

/// SHA-512 over multiple concatenated fragments, avoiding an
/// intermediate allocation for the common "prefix || body" shape used
/// throughout the DRBGs.
pub fn sha512_concat(parts: &[&[u8]]) -> [u8; SHA512_LEN] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let out = hasher.finalize();
    let mut buf = [0u8; SHA512_LEN];
    buf.copy_from_slice(&out);
    buf
}

/// Stateless `hmac_sha512(key, data) -> 64 bytes`.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; SHA512_LEN] {
    let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key)
        .expect("HMAC accepts keys of any length");
    mac.update(data);
    let out = mac.finalize().into_bytes();
    let mut buf = [0u8; SHA512_LEN];
    buf.copy_from_slice(&out);
    buf
}

/// HMAC-SHA-512 over multiple concatenated fragments, used by HMAC-DRBG's
/// `update` (§4.G) which hashes `V || tag || provided_data` without
/// wanting to allocate the concatenation first.
pub fn hmac_sha512_concat(key: &[u8], parts: &[&[u8]]) -> [u8; SHA512_LEN] {
    let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key)
        .expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    let out = mac.finalize().into_bytes();
    let mut buf = [0u8; SHA512_LEN];
    buf.copy_from_slice(&out);
    buf
}
