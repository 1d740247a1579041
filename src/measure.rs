//! Warm, time, convert.
//!
//! ```text
//!   elems     = size / 8
//!   warm-up   kernel.touch(elems, stride)          untimed
//!   cycles    = fitter.measure_cycles(kernel, elems, stride)
//!   MB/s      = (size / stride) / (cycles / MHz)
//! ```
//!
//! `size / stride` is the byte volume one pass actually reads and
//! `cycles / MHz` is microseconds, so the ratio is bytes per microsecond,
//! i.e. MB/s.

use std::hint::black_box;

use tracing::debug;

use crate::config::ELEM_SIZE;
use crate::error::{MountainError, Result};
use crate::kernel::AccessKernel;
use crate::timing::CycleFitter;

/// One point on the mountain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementResult {
    pub size_bytes: usize,
    pub stride: usize,
    pub bandwidth_mbps: f64,
}

pub struct ThroughputMeasurer<K, F> {
    kernel: K,
    fitter: F,
    mhz: f64,
}

impl<K: AccessKernel, F: CycleFitter> ThroughputMeasurer<K, F> {
    pub fn new(kernel: K, fitter: F, mhz: f64) -> Self {
        Self { kernel, fitter, mhz }
    }

    /// Read bandwidth in MB/s for a `size_bytes` working set walked with `stride`.
    pub fn measure(&mut self, size_bytes: usize, stride: usize) -> Result<f64> {
        if stride == 0 {
            return Err(MountainError::ZeroStride);
        }
        let elems = size_bytes / ELEM_SIZE;
        if let Some(capacity) = self.kernel.capacity() {
            if elems > capacity {
                return Err(MountainError::CapacityExceeded {
                    requested: elems,
                    capacity,
                });
            }
        }

        // Warm the cache so the timed passes see the steady state.
        black_box(self.kernel.touch(elems, stride)?);

        let cycles = self.fitter.measure_cycles(&self.kernel, elems, stride)?;
        let bandwidth = bandwidth_mbps(size_bytes, stride, cycles, self.mhz);
        debug!(size_bytes, stride, cycles, bandwidth, "measured");
        Ok(bandwidth)
    }

    pub fn measure_result(&mut self, size_bytes: usize, stride: usize) -> Result<MeasurementResult> {
        Ok(MeasurementResult {
            size_bytes,
            stride,
            bandwidth_mbps: self.measure(size_bytes, stride)?,
        })
    }
}

/// `(size_bytes / stride) / (cycles / mhz)`, the size division being integer.
pub fn bandwidth_mbps(size_bytes: usize, stride: usize, cycles: f64, mhz: f64) -> f64 {
    (size_bytes / stride) as f64 / (cycles / mhz)
}
