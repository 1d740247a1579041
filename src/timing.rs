//! Cycle counter, clock-rate estimate and the K-best cycle fitter.
//!
//! ```text
//!   Clock::estimate_frequency_mhz()     cycles per microsecond, once per run
//!   CycleFitter::measure_cycles(k,..)   robust cycle count for one k.touch()
//! ```
//!
//! On x86_64 the counter is `rdtsc`. Elsewhere it is a monotonic nanosecond
//! count, which makes the estimated frequency ~1000 MHz and keeps the
//! cycles-to-seconds conversion consistent.

use std::hint::black_box;
use std::time::Duration;

use tracing::debug;

use crate::error::{MountainError, Result};
use crate::kernel::AccessKernel;

// ═══════════════════════════════════════════════════════════════════════════
//                              Cycle Counter
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_counter() -> u64 {
    // SAFETY: rdtsc has no memory effects and is available on every x86_64 CPU.
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
pub fn read_counter() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Counter ticks elapsed since `start`, never less than one.
#[inline(always)]
fn ticks_since(start: u64) -> u64 {
    read_counter().saturating_sub(start).max(1)
}

// ═══════════════════════════════════════════════════════════════════════════
//                                  Clock
// ═══════════════════════════════════════════════════════════════════════════

pub trait Clock {
    fn estimate_frequency_mhz(&self) -> Result<f64>;
}

/// Counts counter ticks across a sleep.
#[derive(Debug, Clone)]
pub struct TscClock {
    sleep: Duration,
}

impl TscClock {
    pub const DEFAULT_SLEEP: Duration = Duration::from_secs(2);

    pub fn with_sleep(sleep: Duration) -> Self {
        Self { sleep }
    }
}

impl Default for TscClock {
    fn default() -> Self {
        Self::with_sleep(Self::DEFAULT_SLEEP)
    }
}

impl Clock for TscClock {
    fn estimate_frequency_mhz(&self) -> Result<f64> {
        let micros = self.sleep.as_secs_f64() * 1e6;
        if micros <= 0.0 {
            return Err(MountainError::Calibration(
                "calibration interval must be non-zero".to_string(),
            ));
        }

        let start = read_counter();
        let wall = std::time::Instant::now();
        std::thread::sleep(self.sleep);
        let cycles = read_counter().saturating_sub(start);
        // Oversleeping is common; divide by the time that actually passed.
        let elapsed_us = wall.elapsed().as_secs_f64() * 1e6;

        let mhz = cycles as f64 / elapsed_us.max(micros);
        if !mhz.is_finite() || mhz <= 0.0 {
            return Err(MountainError::Calibration(format!(
                "counter advanced {cycles} ticks over {elapsed_us:.0} us"
            )));
        }
        debug!(mhz, cycles, "clock calibrated");
        Ok(mhz)
    }
}

/// A clock that reports a fixed rate. For tests and deterministic runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn estimate_frequency_mhz(&self) -> Result<f64> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return Err(MountainError::Calibration(format!(
                "fixed rate {} MHz is not positive",
                self.0
            )));
        }
        Ok(self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//                               Cycle Fitter
// ═══════════════════════════════════════════════════════════════════════════

pub trait CycleFitter {
    /// Cycles taken by one `kernel.touch(elems, stride)`, robust to noise.
    fn measure_cycles<K: AccessKernel + ?Sized>(
        &mut self,
        kernel: &K,
        elems: usize,
        stride: usize,
    ) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KBestConfig {
    /// Number of smallest samples that must agree.
    pub k: usize,
    /// Relative spread allowed between the smallest and the k-th smallest.
    pub epsilon: f64,
    pub max_samples: usize,
    /// Walk a junk buffer before every trial to evict the working set.
    pub clear_cache: bool,
    pub cache_bytes: usize,
    pub cache_block: usize,
}

impl Default for KBestConfig {
    fn default() -> Self {
        Self {
            k: 3,
            epsilon: 0.01,
            max_samples: 20,
            clear_cache: false,
            cache_bytes: 1 << 19,
            cache_block: 32,
        }
    }
}

/// Runs the kernel until the K smallest samples agree within epsilon (or the
/// sample budget runs out) and reports the smallest.
#[derive(Debug)]
pub struct KBestFitter {
    config: KBestConfig,
    /// Ascending, at most `k` entries.
    best: Vec<u64>,
    samples: usize,
    junk: Vec<u64>,
}

impl KBestFitter {
    pub fn new(config: KBestConfig) -> Self {
        let k = config.k.max(1);
        let junk = if config.clear_cache {
            vec![0u64; config.cache_bytes / std::mem::size_of::<u64>()]
        } else {
            Vec::new()
        };
        Self {
            config: KBestConfig { k, ..config },
            best: Vec::with_capacity(k),
            samples: 0,
            junk,
        }
    }

    pub fn config(&self) -> &KBestConfig {
        &self.config
    }

    /// Samples taken by the last `measure_cycles` call.
    pub fn samples_taken(&self) -> usize {
        self.samples
    }

    fn add_sample(&mut self, cycles: u64) {
        self.samples += 1;
        let pos = self.best.partition_point(|&c| c <= cycles);
        if pos < self.config.k {
            if self.best.len() == self.config.k {
                self.best.pop();
            }
            self.best.insert(pos, cycles);
        }
    }

    fn has_converged(&self) -> bool {
        if self.best.len() < self.config.k {
            return false;
        }
        let fastest = self.best[0] as f64;
        let kth = self.best[self.config.k - 1] as f64;
        (1.0 + self.config.epsilon) * fastest >= kth
    }

    fn clear_cache(&mut self) {
        let step = (self.config.cache_block / std::mem::size_of::<u64>()).max(1);
        let mut x = 0u64;
        for slot in self.junk.iter_mut().step_by(step) {
            x = x.wrapping_add(*slot);
            *slot = x;
        }
        black_box(x);
    }
}

impl Default for KBestFitter {
    fn default() -> Self {
        Self::new(KBestConfig::default())
    }
}

impl CycleFitter for KBestFitter {
    fn measure_cycles<K: AccessKernel + ?Sized>(
        &mut self,
        kernel: &K,
        elems: usize,
        stride: usize,
    ) -> Result<f64> {
        self.best.clear();
        self.samples = 0;

        loop {
            if self.config.clear_cache {
                self.clear_cache();
            }
            let start = read_counter();
            let sum = kernel.touch(black_box(elems), black_box(stride))?;
            let cycles = ticks_since(start);
            black_box(sum);

            self.add_sample(cycles);
            if self.has_converged() || self.samples >= self.config.max_samples {
                break;
            }
        }

        debug!(
            elems,
            stride,
            samples = self.samples,
            converged = self.has_converged(),
            "cycles fitted"
        );
        Ok(self.best[0] as f64)
    }
}
