//! Trivium 80/80 stream generator (§4.H).
//!
//! A fast, non-cryptographic-strength-budget stream of random words for
//! callers that do not need DRBG-grade guarantees — bignum candidate
//! sampling and similar cheap integer draws. Reseeded from the pool on a
//! fixed 2^20-byte budget; the key is a fixed 80-bit constant embedded in
//! the binary, matched exactly to the upstream generator this module is
//! ported from so the keystream schedule is unchanged.

use zeroize::Zeroize;

use crate::entropy::Pool;
use crate::error::RngError;

const KEY_SIZE: usize = 10;
const IV_SIZE: usize = 10;

/// Bytes of keystream between automatic reseeds.
pub const RESEED_PERIOD: i64 = 1 << 20;

/// The first 80 bits of the first 7 decimal digits of the square roots of
/// the first four primes. Fixed and public by design: Trivium's security
/// margin comes from the fresh IV drawn from the pool on every reseed, not
/// from secrecy of this constant.
const TRIVIUM_KEY: [u8; KEY_SIZE] = [0xfc, 0xd0, 0xdf, 0x7d, 0x9d, 0xe4, 0x80, 0xac, 0xf8, 0xa2];

/// Trivium's 288-bit internal register, packed into nine 32-bit words
/// (`x1..x9`), plus the byte-since-reseed counter.
pub struct Trivium {
    x: [u32; 9],
    ctr: i64,
    pool: std::sync::Arc<Pool>,
}

impl Trivium {
    /// `start(pool)` — the pool must already be running.
    pub fn start(pool: std::sync::Arc<Pool>) -> Result<Self, RngError> {
        if !pool.is_started() {
            return Err(RngError::NotInitialized);
        }
        let mut trivium = Self {
            x: [0u32; 9],
            ctr: -1,
            pool,
        };
        trivium.reseed()?;
        Ok(trivium)
    }

    /// `reset()` — zero the register and mark the generator uninstantiated.
    pub fn stop(&mut self) {
        self.x = [0u32; 9];
        self.ctr = -1;
    }

    /// Draw a fresh 80-bit IV from the pool, combine with the fixed key,
    /// and run the four-cycle blank-round warmup.
    fn reseed(&mut self) -> Result<(), RngError> {
        let mut iv = [0u8; IV_SIZE];
        self.pool.fetch(&mut iv, false)?;
        self.x = init(&TRIVIUM_KEY, &iv);
        self.ctr = 0;
        iv.zeroize();
        Ok(())
    }

    fn ensure_seeded(&mut self) -> Result<(), RngError> {
        if self.ctr < 0 || self.ctr >= RESEED_PERIOD {
            self.reseed()?;
        }
        Ok(())
    }

    /// 8 bits of keystream, MSB-first.
    pub fn rand8(&mut self) -> Result<u8, RngError> {
        self.ensure_seeded()?;
        let mut out = 0u8;
        for _ in 0..8 {
            out = (out << 1) | update_rotate(&mut self.x);
        }
        self.ctr += 1;
        Ok(out)
    }

    /// 16 bits of keystream, MSB-first.
    pub fn rand16(&mut self) -> Result<u16, RngError> {
        self.ensure_seeded()?;
        let mut out = 0u16;
        for _ in 0..16 {
            out = (out << 1) | update_rotate(&mut self.x) as u16;
        }
        self.ctr += 2;
        Ok(out)
    }

    /// 32 bits of keystream, MSB-first.
    pub fn rand32(&mut self) -> Result<u32, RngError> {
        self.ensure_seeded()?;
        let mut out = 0u32;
        for _ in 0..32 {
            out = (out << 1) | update_rotate(&mut self.x) as u32;
        }
        self.ctr += 4;
        Ok(out)
    }

    /// 64 bits of keystream, MSB-first.
    pub fn rand64(&mut self) -> Result<u64, RngError> {
        self.ensure_seeded()?;
        let mut out = 0u64;
        for _ in 0..64 {
            out = (out << 1) | update_rotate(&mut self.x) as u64;
        }
        self.ctr += 8;
        Ok(out)
    }

    /// Fill `buf` with keystream bytes, one `rand8` per byte.
    pub fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<(), RngError> {
        for b in buf.iter_mut() {
            *b = self.rand8()?;
        }
        Ok(())
    }
}

/// `init(k, iv)` (§4.H): load the key into the high end of the 93-bit
/// sub-register, the IV into the second, set the fixed `1`-bits at the
/// top of the third, then run 4*288 blank update/rotate cycles.
fn init(k: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE]) -> [u32; 9] {
    let mut x = [0u32; 9];

    x[0] = ((k[3] as u32) << 24) | ((k[2] as u32) << 16) | ((k[1] as u32) << 8) | k[0] as u32;
    x[1] = ((k[7] as u32) << 24) | ((k[6] as u32) << 16) | ((k[5] as u32) << 8) | k[4] as u32;
    x[2] = (((iv[0] as u32) & 0x7) << 29) | ((k[9] as u32) << 8) | k[8] as u32;
    x[3] = (((iv[4] as u32) & 0x7) << 29)
        | ((iv[3] as u32) << 21)
        | ((iv[2] as u32) << 13)
        | ((iv[1] as u32) << 5)
        | (((iv[0] as u32) & 0xf8) >> 3);
    x[4] = (((iv[8] as u32) & 0x7) << 29)
        | ((iv[7] as u32) << 21)
        | ((iv[6] as u32) << 13)
        | ((iv[5] as u32) << 5)
        | (((iv[4] as u32) & 0xf8) >> 3);
    x[5] = ((iv[8] as u32) & 0xf8) >> 3;
    x[6] = 0;
    x[7] = 0;
    x[8] = 0xe0000000;

    for _ in 0..4 * 288 {
        update_rotate(&mut x);
    }

    x
}

/// `step()` (§4.H): compute the output bit and rotate the three
/// sub-registers, feeding each one's new input bit from the other two.
fn update_rotate(x: &mut [u32; 9]) -> u8 {
    let mut t1 = ((x[2] >> 1) ^ (x[2] >> 28)) & 1;
    let mut t2 = ((x[5] >> 1) ^ (x[5] >> 16)) & 1;
    let mut t3 = ((x[7] >> 18) ^ (x[8] >> 31)) & 1;
    let z = (t1 ^ t2 ^ t3) as u8;

    t1 = (t1 ^ ((x[2] >> 26) & (x[2] >> 27)) ^ (x[5] >> 10)) & 1;
    t2 = (t2 ^ ((x[5] >> 14) & (x[5] >> 15)) ^ (x[8] >> 7)) & 1;
    t3 = (t3 ^ ((x[8] >> 29) & (x[8] >> 30)) ^ (x[2] >> 4)) & 1;

    x[8] = (x[8] << 1) | (x[7] >> 31);
    x[7] = (x[7] << 1) | (x[6] >> 31);
    x[6] = (x[6] << 1) | (x[5] >> 31);
    x[5] = ((x[5] << 1) & ((t2 << 17) | 0xfffdffff)) | (x[4] >> 31);
    x[4] = (x[4] << 1) | (x[3] >> 31);
    x[3] = (x[3] << 1) | (x[2] >> 31);
    x[2] = ((x[2] << 1) & ((t1 << 29) | 0xdfffffff)) | (x[1] >> 31);
    x[1] = (x[1] << 1) | (x[0] >> 31);
    x[0] = (x[0] << 1) | t3;

    z
}
