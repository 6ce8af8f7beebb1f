//! # cryptorand-core
//!
//! A self-contained entropy pool, three SP 800-90A DRBG constructions, a
//! fast non-cryptographic Trivium stream generator, and the
//! multi-precision bignum/prime-search layer built on top of them.
//!
//! - [`entropy`] — the mixing pool (§4.D) and its source plugins (§4.C):
//!   OS CSPRNG, hardware RNG, timing jitter, system probes, user input.
//! - [`drbg`] — CTR-DRBG (AES-256), Hash-DRBG and HMAC-DRBG (SHA-512),
//!   all behind the shared [`drbg::Drbg`] trait.
//! - [`trivium`] — the Trivium 80/80 stream cipher, reseeded from the
//!   pool on a fixed byte budget, for callers that want a cheap fast
//!   stream rather than DRBG-grade output.
//! - [`bignum`] — variable-length signed-magnitude integers: schoolbook
//!   and Karatsuba multiplication, Knuth division, binary GCD, modular
//!   inverse, Montgomery modular exponentiation.
//! - [`prime`] — Miller-Rabin primality testing and probable-prime
//!   generation (including safe primes), built on `bignum` and driven
//!   by any `Drbg`.
//!
//! Errors are hand-rolled enums per concern (see [`error`]) rather than
//! a single crate-wide error type, mirroring how the teacher's DRBG and
//! pool code keep their failure domains separate.

pub mod bignum;
pub mod drbg;
pub mod entropy;
pub mod error;
pub mod prime;
pub mod primitives;
pub mod trivium;

pub use bignum::Bignum;
pub use drbg::Drbg;
pub use entropy::Pool;
pub use trivium::Trivium;
