//! Leaf cryptographic primitives: AES-256 block cipher (§4.A) and
//! SHA-512/HMAC-SHA-512 (§4.B). Everything above this module is built
//! out of these two files plus the `aes`/`sha2`/`hmac` crates they wrap.

pub mod aes256;
pub mod hash;
