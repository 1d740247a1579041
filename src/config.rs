//! Sweep bounds and kernel selection.
//!
//! Everything here is fixed at compile time. `MountainConfig` only exists so
//! tests and benches can run the same harness over a smaller domain; the
//! binary always uses `MountainConfig::default()`.

use std::path::PathBuf;

use crate::error::{MountainError, Result};

/// Working set size ranges from 2 KB ...
pub const MIN_BYTES: usize = 1 << 11;
/// ... up to 32 MB.
pub const MAX_BYTES: usize = 1 << 25;
/// Strides range from 1 to 64 elements.
pub const MAX_STRIDE: usize = 64;

pub const ELEM_SIZE: usize = std::mem::size_of::<f64>();

/// Backing file for the disk kernel, relative to the working directory.
pub const INPUT_PATH: &str = "input.txt";

/// Where the access kernel reads its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelMode {
    #[default]
    MemoryBacked,
    /// One mapped-file line lookup per visited element. Not part of the
    /// default sweep.
    DiskBacked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountainConfig {
    pub min_bytes: usize,
    pub max_bytes: usize,
    pub max_stride: usize,
    pub mode: KernelMode,
    pub input_path: PathBuf,
}

impl Default for MountainConfig {
    fn default() -> Self {
        Self {
            min_bytes: MIN_BYTES,
            max_bytes: MAX_BYTES,
            max_stride: MAX_STRIDE,
            mode: KernelMode::default(),
            input_path: PathBuf::from(INPUT_PATH),
        }
    }
}

impl MountainConfig {
    /// A memory-backed config over `[min_bytes, max_bytes]` and strides `1..=max_stride`.
    pub fn with_bounds(min_bytes: usize, max_bytes: usize, max_stride: usize) -> Self {
        Self {
            min_bytes,
            max_bytes,
            max_stride,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_bytes.is_power_of_two() || !self.max_bytes.is_power_of_two() {
            return Err(MountainError::InvalidConfig(format!(
                "sizes must be powers of two (min {}, max {})",
                self.min_bytes, self.max_bytes
            )));
        }
        if self.min_bytes < ELEM_SIZE {
            return Err(MountainError::InvalidConfig(format!(
                "min size {} is smaller than one element",
                self.min_bytes
            )));
        }
        if self.min_bytes > self.max_bytes {
            return Err(MountainError::InvalidConfig(format!(
                "min size {} exceeds max size {}",
                self.min_bytes, self.max_bytes
            )));
        }
        if self.max_stride == 0 {
            return Err(MountainError::ZeroStride);
        }
        // Every point must read at least one byte per pass.
        if self.min_bytes < self.max_stride {
            return Err(MountainError::InvalidConfig(format!(
                "min size {} is smaller than max stride {}",
                self.min_bytes, self.max_stride
            )));
        }
        Ok(())
    }

        /// Number of size steps from max down to min, both ends included.
    pub fn size_steps(&self) -> usize {
        (self.max_bytes / self.min_bytes).trailing_zeros() as usize + 1
    }

    pub fn measurement_count(&self) -> usize {
        self.max_stride * self.size_steps()
    }
}
