//! Entropy source plugins (§4.C, §6 "Entropy-source plugin interface").
//!
//! Each source implements `name()`, `available()`, and `try_fill()`, with a
//! three-way outcome (`Ok`, `SoftFail`, `HardFail`) matching §6's
//! `ok | soft-fail | hard-fail` contract. Ordering and weighting of sources
//! within a poll is fixed by [`crate::entropy::pool::Pool`], not by the
//! sources themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Outcome of a single `try_fill` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Exactly this many bytes of `buf` were written with source output.
    Ok(usize),
    /// The source is temporarily unavailable; not fatal outside strict mode.
    SoftFail,
    /// The source failed in a way that should abort the poll under strict mode.
    HardFail,
}

/// An entropy source plugin.
pub trait EntropySource: Send + Sync {
    /// Stable identifier for audit/logging.
    fn name(&self) -> &str;
    /// Cheap check for whether this source can currently be used.
    fn available(&self) -> bool;
    /// Attempt to fill `buf` with source bytes.
    fn try_fill(&self, buf: &mut [u8]) -> FillOutcome;
}

/// OS CSPRNG entropy source, via `getrandom`.
#[derive(Default)]
pub struct OsCsprng;

impl EntropySource for OsCsprng {
    fn name(&self) -> &str {
        "os-csprng"
    }

    fn available(&self) -> bool {
        true
    }

    fn try_fill(&self, buf: &mut [u8]) -> FillOutcome {
        match getrandom::getrandom(buf) {
            Ok(()) => FillOutcome::Ok(buf.len()),
            Err(e) => {
                log::warn!("os-csprng source failed: {e}");
                FillOutcome::HardFail
            }
        }
    }
}

/// Hardware CPU RNG instruction source (RDRAND on x86_64). A carry-flag
/// underflow at any step is retried a bounded number of times before
/// surfacing as `HardFail`, per §4.C.
#[derive(Default)]
pub struct HardwareRng;

const RDRAND_RETRY_LIMIT: u32 = 10;

impl EntropySource for HardwareRng {
    fn name(&self) -> &str {
        "hardware-rng"
    }

    #[cfg(target_arch = "x86_64")]
    fn available(&self) -> bool {
        std::is_x86_feature_detected!("rdrand")
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn available(&self) -> bool {
        false
    }

    #[cfg(target_arch = "x86_64")]
    fn try_fill(&self, buf: &mut [u8]) -> FillOutcome {
        if !self.available() {
            return FillOutcome::SoftFail;
        }
        let mut written = 0;
        while written < buf.len() {
            match rdrand_u64() {
                Some(word) => {
                    let bytes = word.to_le_bytes();
                    let n = (buf.len() - written).min(bytes.len());
                    buf[written..written + n].copy_from_slice(&bytes[..n]);
                    written += n;
                }
                None => {
                    log::warn!("hardware-rng exhausted retries");
                    return FillOutcome::HardFail;
                }
            }
        }
        FillOutcome::Ok(written)
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn try_fill(&self, _buf: &mut [u8]) -> FillOutcome {
        FillOutcome::SoftFail
    }
}

#[cfg(target_arch = "x86_64")]
fn rdrand_u64() -> Option<u64> {
    use std::arch::x86_64::_rdrand64_step;
    for _ in 0..RDRAND_RETRY_LIMIT {
        let mut val: u64 = 0;
        // SAFETY: guarded by `is_x86_feature_detected!("rdrand")` in `available()`.
        let ok = unsafe { _rdrand64_step(&mut val) };
        if ok == 1 {
            return Some(val);
        }
    }
    None
}

/// Timing-jitter entropy collector, used exclusively during the slow poll.
///
/// Modeled on `evangipson-jitterbug`'s approach: measure CPU-cycle deltas
/// around cheap, data-independent work, then whiten the accumulated deltas
/// with a hash. Jitter-RNG failure during a slow poll is always fatal to
/// that poll per §4.D's failure model; this source therefore never
/// soft-fails — it always returns `Ok` or `HardFail`.
pub struct JitterEntropy {
    oversample_rounds: usize,
}

impl Default for JitterEntropy {
    fn default() -> Self {
        // §4.D: "Jitter-RNG (32 bytes at oversampling ratio 1)".
        Self { oversample_rounds: 1 }
    }
}

impl EntropySource for JitterEntropy {
    fn name(&self) -> &str {
        "jitter-rng"
    }

    fn available(&self) -> bool {
        true
    }

    fn try_fill(&self, buf: &mut [u8]) -> FillOutcome {
        static CALL_COUNTER: AtomicU64 = AtomicU64::new(0);

        let mut samples: Vec<u64> = Vec::with_capacity(buf.len() * 8 * self.oversample_rounds);
        for _ in 0..self.oversample_rounds {
            for _ in 0..(buf.len() * 8) {
                let t1 = Instant::now();
                // Data-independent busy work whose timing varies with cache/scheduler jitter.
                let mut acc: u64 = 0;
                for i in 0..64u64 {
                    acc = acc.wrapping_add(i).rotate_left(7);
                }
                std::hint::black_box(acc);
                let t2 = Instant::now();
                samples.push(t2.duration_since(t1).as_nanos() as u64);
            }
        }

        if samples.is_empty() {
            return FillOutcome::HardFail;
        }

        let call_id = CALL_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut state = call_id ^ 0x9e3779b97f4a7c15;
        let mut written = 0;
        let mut word_idx = 0usize;
        while written < buf.len() {
            for &s in samples.iter().skip(word_idx) {
                state = split_mix_64(state ^ s);
            }
            word_idx = samples.len();
            let bytes = state.to_le_bytes();
            let n = (buf.len() - written).min(bytes.len());
            buf[written..written + n].copy_from_slice(&bytes[..n]);
            written += n;
        }
        FillOutcome::Ok(written)
    }
}

fn split_mix_64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// A single keyboard or mouse event observed by the host application and
/// handed to the pool's user-event collector (§4.C, §9 "User-input hooks").
///
/// Unlike the original Windows source, which installs a global message-pump
/// hook, this crate treats input capture as the host's responsibility: the
/// host owns whatever OS-specific hook it likes and pushes events into
/// [`UserEventCollector::record`]. This keeps the OS-abstraction boundary
/// exactly where §9's Design Notes put it: "isolated behind a capability
/// handed to the pool only when events are enabled".
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    /// A key press, identified by a platform-defined key code.
    Key(u32),
    /// A mouse move to absolute coordinates.
    MouseMove(i32, i32),
}

/// Default per-fetch event budget (§4.C): beyond this many qualifying
/// events, the collector stops posting until the next `fetch`.
pub const DEFAULT_EVENT_BUDGET: usize = 256;

/// Coalesces and CRC-32s user input events into 32-bit words.
pub struct UserEventCollector {
    budget: usize,
    last_key: std::sync::Mutex<Option<u32>>,
    last_mouse: std::sync::Mutex<Option<(i32, i32)>>,
    last_event_at: std::sync::Mutex<Instant>,
    queue: std::sync::Mutex<Vec<u32>>,
}

impl UserEventCollector {
    /// Create a collector with the default event budget.
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_EVENT_BUDGET)
    }

    /// Create a collector with a caller-supplied per-fetch event budget.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget,
            last_key: std::sync::Mutex::new(None),
            last_mouse: std::sync::Mutex::new(None),
            last_event_at: std::sync::Mutex::new(Instant::now()),
            queue: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Record one event from the host's input hook. Applies the
    /// qualifier (coalesce identical consecutive keys; ignore redundant
    /// mouse moves at the same coordinate) and the per-fetch budget.
    pub fn record(&self, event: InputEvent) {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= self.budget {
            return;
        }

        let qualifies = match event {
            InputEvent::Key(code) => {
                let mut last = self.last_key.lock().unwrap();
                let q = *last != Some(code);
                *last = Some(code);
                q
            }
            InputEvent::MouseMove(x, y) => {
                let mut last = self.last_mouse.lock().unwrap();
                let q = *last != Some((x, y));
                *last = Some((x, y));
                q
            }
        };
        if !qualifies {
            return;
        }

        let now = Instant::now();
        let elapsed_ns = {
            let mut last_at = self.last_event_at.lock().unwrap();
            let d = now.duration_since(*last_at).as_nanos() as u64;
            *last_at = now;
            d
        };

        let mut hasher = crc32fast::Hasher::new();
        match event {
            InputEvent::Key(code) => hasher.update(&code.to_le_bytes()),
            InputEvent::MouseMove(x, y) => {
                hasher.update(&x.to_le_bytes());
                hasher.update(&y.to_le_bytes());
            }
        }
        hasher.update(&elapsed_ns.to_le_bytes());
        queue.push(hasher.finalize());
    }

    /// Drain accumulated CRC words (one 32-bit word per qualifying event)
    /// for mixing into the pool, resetting the per-fetch budget.
    pub fn drain(&self) -> Vec<u32> {
        std::mem::take(&mut *self.queue.lock().unwrap())
    }
}

impl Default for UserEventCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Process/thread/system probe bundle (§4.C last bullet): process and
/// thread identity, memory status, disk I/O counters, network statistics,
/// and high-resolution time. Backed by `sysinfo` rather than hand-rolled
/// per-platform FFI (see SPEC_FULL.md A.6).
pub struct SystemProbes {
    system: std::sync::Mutex<sysinfo::System>,
}

impl Default for SystemProbes {
    fn default() -> Self {
        Self {
            system: std::sync::Mutex::new(sysinfo::System::new()),
        }
    }
}

impl SystemProbes {
    /// Collect the fast-poll-eligible probes: process/thread ids, times,
    /// and high-resolution system time. Cheap; safe to run on every fast poll.
    pub fn fast_probe(&self, sink: &mut Vec<u8>) {
        sink.extend_from_slice(&(std::process::id() as u64).to_le_bytes());
        sink.extend_from_slice(&thread_id_bytes());
        sink.extend_from_slice(&high_res_time().to_le_bytes());
    }

    /// Collect the slow-poll-eligible wide system probes: refreshed
    /// process/memory/disk/network statistics.
    pub fn slow_probe(&self, sink: &mut Vec<u8>) {
        let mut system = self.system.lock().unwrap();
        system.refresh_all();

        sink.extend_from_slice(&system.total_memory().to_le_bytes());
        sink.extend_from_slice(&system.used_memory().to_le_bytes());
        sink.extend_from_slice(&system.total_swap().to_le_bytes());
        sink.extend_from_slice(&system.used_swap().to_le_bytes());

        for (pid, process) in system.processes().iter().take(32) {
            sink.extend_from_slice(&(pid.as_u32() as u64).to_le_bytes());
            sink.extend_from_slice(&process.run_time().to_le_bytes());
            sink.extend_from_slice(&process.memory().to_le_bytes());
        }

        let disks = sysinfo::Disks::new_with_refreshed_list();
        for disk in disks.list() {
            sink.extend_from_slice(&disk.available_space().to_le_bytes());
            sink.extend_from_slice(&disk.total_space().to_le_bytes());
        }

        let networks = sysinfo::Networks::new_with_refreshed_list();
        for (_name, data) in networks.iter() {
            sink.extend_from_slice(&data.total_received().to_le_bytes());
            sink.extend_from_slice(&data.total_transmitted().to_le_bytes());
        }
    }
}

fn thread_id_bytes() -> [u8; 8] {
    // `ThreadId` has no stable numeric accessor; hash its Debug form instead,
    // which is stable enough for entropy (not for identity comparisons).
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish().to_le_bytes()
}

fn high_res_time() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
