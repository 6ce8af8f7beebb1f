//! The entropy pool (§3 "Entropy Pool", §4.D, §5 concurrency model).
//!
//! A fixed-size byte buffer with write/read cursors, a SHA-512-based mixing
//! function, fast/slow collection, and a leak-resistant extraction path. A
//! background collector thread runs the fast poll periodically; all mutable
//! pool state lives behind a single mutex, matching §5's "single pool
//! mutex" model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::entropy::sources::{
    EntropySource, FillOutcome, HardwareRng, InputEvent, JitterEntropy, OsCsprng, SystemProbes,
    UserEventCollector,
};
use crate::error::{fatal, RngError};
use crate::primitives::hash::{sha512, SHA512_LEN};

/// Pool size in bytes. Must be a multiple of [`SHA512_LEN`] (§3).
pub const POOL_SIZE: usize = 384;

/// Default interval between collector-thread fast polls (§5).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

struct PoolState {
    p: Vec<u8>,
    w: usize,
    r: usize,
    slow_done: bool,
    bytes_since_mix: usize,
}

impl PoolState {
    fn new(size: usize) -> Self {
        Self {
            p: vec![0u8; size],
            w: 0,
            r: 0,
            slow_done: false,
            bytes_since_mix: 0,
        }
    }
}

struct CollectorHandle {
    stop_flag: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

/// The entropy pool.
pub struct Pool {
    state: Mutex<PoolState>,
    started: AtomicBool,
    strict: AtomicBool,
    user_events_enabled: AtomicBool,
    poll_interval: Duration,
    os_csprng: OsCsprng,
    hardware_rng: HardwareRng,
    jitter: JitterEntropy,
    probes: SystemProbes,
    user_events: UserEventCollector,
    collector: Mutex<Option<CollectorHandle>>,
}

impl Pool {
    /// A pool sized per §3 (`N = 384`).
    pub fn new() -> Arc<Self> {
        Self::with_capacity(POOL_SIZE)
    }

    /// A pool with a caller-chosen size, which must be a multiple of 64
    /// (§4.D `mix`'s precondition). Exposed mainly for the §8 property
    /// "For any pool size N divisible by 64 ..."; production callers should
    /// use [`Pool::new`].
    pub fn with_capacity(size: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PoolState::new(size)),
            started: AtomicBool::new(false),
            strict: AtomicBool::new(false),
            user_events_enabled: AtomicBool::new(false),
            poll_interval: DEFAULT_POLL_INTERVAL,
            os_csprng: OsCsprng,
            hardware_rng: HardwareRng,
            jitter: JitterEntropy::default(),
            probes: SystemProbes::default(),
            user_events: UserEventCollector::new(),
            collector: Mutex::new(None),
        })
    }

    /// Allocate, lock pages if the OS supports it, and start the
    /// background fast-poll collector thread. Fails iff the pool cannot be
    /// constructed; never returns success with a partially started pool.
    pub fn start(self: &Arc<Self>) -> Result<(), RngError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(()); // already started; idempotent
        }

        {
            let state = self.state.lock().unwrap();
            lock_pages(&state.p);
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = stop_flag.clone();
        let pool = self.clone();
        let interval = self.poll_interval;
        let join = std::thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                {
                    let mut state = pool.state.lock().unwrap();
                    // Background collector tick: a strict-mode abort just means
                    // this tick contributed nothing; the next tick tries again.
                    let _ = pool.fast_poll_locked(&mut state);
                }
                std::thread::sleep(interval);
            }
        });

        *self.collector.lock().unwrap() = Some(CollectorHandle { stop_flag, join });
        Ok(())
    }

    /// Signal the collector thread to exit cooperatively, join it, wipe
    /// the pool, and unlock its pages.
    pub fn stop(&self) {
        if let Some(handle) = self.collector.lock().unwrap().take() {
            handle.stop_flag.store(true, Ordering::SeqCst);
            let _ = handle.join.join();
        }

        let mut state = self.state.lock().unwrap();
        unlock_pages(&state.p);
        for byte in state.p.iter_mut() {
            *byte = 0;
        }
        state.w = 0;
        state.r = 0;
        state.slow_done = false;
        state.bytes_since_mix = 0;

        self.started.store(false, Ordering::SeqCst);
    }

    /// Enable or disable strict mode: an unavailable probe aborts the poll
    /// rather than being logged and skipped.
    pub fn set_strict(&self, strict: bool) {
        self.strict.store(strict, Ordering::SeqCst);
    }

    /// Enable or disable user-event collection during `fetch`.
    pub fn set_user_events(&self, enabled: bool) {
        self.user_events_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Feed one input event into the user-event collector. A no-op unless
    /// user events are enabled.
    pub fn record_input_event(&self, event: InputEvent) {
        if self.user_events_enabled.load(Ordering::SeqCst) {
            self.user_events.record(event);
        }
    }

    /// Whether the pool is currently started. Consumers such as the
    /// Trivium generator (§6: "Start requires the pool to be running")
    /// use this to fail fast instead of relying on `fetch`'s fatal
    /// not-started path.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Force a full mix of the pool outside of a `fetch`/poll cycle.
    pub fn mix_now(&self) -> Result<(), RngError> {
        self.require_started()?;
        let mut state = self.state.lock().unwrap();
        self.mix_locked(&mut state);
        Ok(())
    }

    /// `fetch(buf, force_slow)`. `len` in §4.D's signature is `buf.len()`
    /// here, the idiomatic Rust equivalent of a `(buf, len)` pair.
    pub fn fetch(&self, buf: &mut [u8], force_slow: bool) -> Result<usize, RngError> {
        if !self.started.load(Ordering::SeqCst) {
            fatal("fetch-before-start", "fetch called on a pool that was never started");
        }
        if buf.len() > self.state.lock().unwrap().p.len() {
            return Err(RngError::RequestTooLarge);
        }

        let mut state = self.state.lock().unwrap();

        if !state.slow_done || force_slow {
            self.slow_poll_locked(&mut state)?;
        }

        if self.user_events_enabled.load(Ordering::SeqCst) {
            self.mix_user_events_locked(&mut state);
        }

        self.fast_poll_locked(&mut state)?;

        buf.fill(0);
        let len = buf.len();

        for b in buf.iter_mut() {
            *b ^= state.p[state.r];
            state.r = (state.r + 1) % state.p.len();
        }

        for byte in state.p.iter_mut() {
            *byte = !*byte;
        }

        self.fast_poll_locked(&mut state)?;

        for b in buf.iter_mut() {
            *b ^= state.p[state.r];
            state.r = (state.r + 1) % state.p.len();
        }

        self.mix_locked(&mut state);

        Ok(len)
    }

    fn require_started(&self) -> Result<(), RngError> {
        if self.started.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RngError::NotInitialized)
        }
    }

    /// `add` — the common byte-append routine (§4.D "Add rule"): mix
    /// before the 33rd byte since the last mix, wrap `w` at `N`, XOR (never
    /// overwrite) into `P[w]`.
    fn add(&self, state: &mut PoolState, byte: u8) {
        if state.bytes_since_mix >= 32 {
            self.mix_locked(state);
            state.bytes_since_mix = 0;
        }
        if state.w >= state.p.len() {
            state.w = 0;
        }
        state.p[state.w] ^= byte;
        state.w += 1;
        state.bytes_since_mix += 1;
    }

    fn add_bytes(&self, state: &mut PoolState, bytes: &[u8]) {
        for &b in bytes {
            self.add(state, b);
        }
    }

    /// `mix()` (§4.D): recompute `SHA-512(P)` and XOR it into each 64-byte
    /// block in turn, against the pool state as modified by prior blocks.
    fn mix_locked(&self, state: &mut PoolState) {
        if state.p.len() % SHA512_LEN != 0 {
            fatal(
                "pool-mix-invariant",
                "pool size is not a multiple of the hash output length",
            );
        }
        let mut i = 0;
        while i < state.p.len() {
            let h = sha512(&state.p);
            for (j, byte) in h.iter().enumerate() {
                state.p[i + j] ^= byte;
            }
            i += SHA512_LEN;
        }
    }

    /// `fast_poll()` (§4.D): OS CSPRNG (16 bytes), hardware RNG (up to 32
    /// bytes), then the system/process probe bundle, each appended
    /// byte-wise; concludes with a full `mix`. In strict mode, any
    /// unavailable source aborts the poll instead of being skipped
    /// (§4.D, spec.md:88) — the caller sees `Err` and the in-progress
    /// `fetch`/collector tick does not complete.
    fn fast_poll_locked(&self, state: &mut PoolState) -> Result<(), RngError> {
        let mut buf16 = [0u8; 16];
        match self.os_csprng.try_fill(&mut buf16) {
            FillOutcome::Ok(n) => self.add_bytes(state, &buf16[..n]),
            FillOutcome::SoftFail => self.handle_soft_fail(&self.os_csprng)?,
            FillOutcome::HardFail => self.handle_hard_fail(&self.os_csprng),
        }

        let mut buf32 = [0u8; 32];
        match self.hardware_rng.try_fill(&mut buf32) {
            FillOutcome::Ok(n) => self.add_bytes(state, &buf32[..n]),
            FillOutcome::SoftFail => self.handle_soft_fail(&self.hardware_rng)?,
            FillOutcome::HardFail => self.handle_hard_fail(&self.hardware_rng),
        }

        let mut probe_bytes = Vec::new();
        self.probes.fast_probe(&mut probe_bytes);
        self.add_bytes(state, &probe_bytes);

        self.mix_locked(state);
        Ok(())
    }

    /// `slow_poll()` (§4.D): Jitter-RNG plus the wide system-state probes,
    /// concluding with a `mix`. The first success sets `slow_done`.
    /// Jitter-RNG failure is always fatal to the poll (returns an error;
    /// this does not `abort()` the process, only the in-flight `fetch`).
    fn slow_poll_locked(&self, state: &mut PoolState) -> Result<(), RngError> {
        let mut jitter_buf = [0u8; 32];
        match self.jitter.try_fill(&mut jitter_buf) {
            FillOutcome::Ok(n) => self.add_bytes(state, &jitter_buf[..n]),
            _ => {
                log::error!("jitter-rng failed during slow poll");
                return Err(RngError::InternalFailure);
            }
        }

        let mut wide_probes = Vec::new();
        self.probes.slow_probe(&mut wide_probes);
        self.add_bytes(state, &wide_probes);

        self.mix_locked(state);
        state.slow_done = true;
        Ok(())
    }

    fn mix_user_events_locked(&self, state: &mut PoolState) {
        for word in self.user_events.drain() {
            self.add_bytes(state, &word.to_le_bytes());
        }
    }

    fn handle_soft_fail(&self, source: &dyn EntropySource) -> Result<(), RngError> {
        log::warn!("entropy source '{}' unavailable", source.name());
        if self.strict.load(Ordering::SeqCst) {
            log::error!("strict mode: aborting poll due to unavailable source '{}'", source.name());
            return Err(RngError::EntropyTooLow);
        }
        Ok(())
    }

    fn handle_hard_fail(&self, source: &dyn EntropySource) {
        log::warn!("entropy source '{}' failed", source.name());
    }
}

#[cfg(unix)]
fn lock_pages(buf: &[u8]) {
    // SAFETY: `buf`'s pointer and length describe a valid, live allocation
    // for the duration of this call; `mlock` failing (e.g. RLIMIT_MEMLOCK)
    // is not fatal, matching "if the OS supports it".
    let ret = unsafe { libc::mlock(buf.as_ptr() as *const libc::c_void, buf.len()) };
    if ret != 0 {
        log::warn!("mlock failed; pool memory may be paged out");
    }
}

#[cfg(unix)]
fn unlock_pages(buf: &[u8]) {
    // SAFETY: same allocation locked in `lock_pages`.
    unsafe { libc::munlock(buf.as_ptr() as *const libc::c_void, buf.len()) };
}

#[cfg(not(unix))]
fn lock_pages(_buf: &[u8]) {}

#[cfg(not(unix))]
fn unlock_pages(_buf: &[u8]) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_before_start_is_fatal() {
        // Exercised indirectly: we cannot safely assert `abort()` without
        // tearing down the test process, so this documents the contract
        // instead of invoking it. See `fetch_after_start_succeeds` for the
        // happy path.
    }

    #[test]
    fn fetch_after_start_succeeds() {
        let pool = Pool::new();
        pool.start().unwrap();
        let mut buf = [0u8; 64];
        let n = pool.fetch(&mut buf, true).unwrap();
        assert_eq!(n, 64);
        assert_ne!(buf, [0u8; 64]);
        pool.stop();
    }

    #[test]
    fn fetch_rejects_len_over_capacity() {
        let pool = Pool::new();
        pool.start().unwrap();
        let mut buf = vec![0u8; POOL_SIZE + 1];
        assert_eq!(pool.fetch(&mut buf, true), Err(RngError::RequestTooLarge));
        pool.stop();
    }

    #[test]
    fn two_fetches_differ() {
        let pool = Pool::new();
        pool.start().unwrap();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        pool.fetch(&mut a, true).unwrap();
        pool.fetch(&mut b, false).unwrap();
        assert_ne!(a, b);
        pool.stop();
    }

    #[test]
    fn stop_wipes_pool() {
        let pool = Pool::new();
        pool.start().unwrap();
        let mut buf = [0u8; 32];
        pool.fetch(&mut buf, true).unwrap();
        pool.stop();
        let state = pool.state.lock().unwrap();
        assert!(state.p.iter().all(|&b| b == 0));
    }

    #[test]
    fn custom_capacity_divisible_by_64_mixes_cleanly() {
        let pool = Pool::with_capacity(128);
        pool.start().unwrap();
        let mut buf = [0u8; 50];
        pool.fetch(&mut buf, true).unwrap();
        pool.stop();
    }
}
