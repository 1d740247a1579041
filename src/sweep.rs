//! Walks the (size, stride) grid: sizes from max down to min halving each
//! step, and for each size strides 1 through max. Order is part of the output
//! contract.

use tracing::info;

use crate::config::MountainConfig;
use crate::error::Result;
use crate::kernel::AccessKernel;
use crate::measure::{MeasurementResult, ThroughputMeasurer};
use crate::timing::CycleFitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingSet {
    pub size_bytes: usize,
    pub stride: usize,
}

/// Iterator over the grid in sweep order.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    min_bytes: usize,
    max_stride: usize,
    size: usize,
    stride: usize,
}

impl SweepPlan {
    /// Callers validate `config` first; an invalid one may yield nothing.
    pub fn new(config: &MountainConfig) -> Self {
        Self {
            min_bytes: config.min_bytes.max(1),
            max_stride: config.max_stride,
            size: config.max_bytes,
            stride: 1,
        }
    }
}

impl Iterator for SweepPlan {
    type Item = WorkingSet;

    fn next(&mut self) -> Option<WorkingSet> {
        if self.stride > self.max_stride {
            self.stride = 1;
            self.size >>= 1;
        }
        if self.max_stride == 0 || self.size < self.min_bytes {
            return None;
        }

        let item = WorkingSet {
            size_bytes: self.size,
            stride: self.stride,
        };
        self.stride += 1;
        Some(item)
    }
}

/// Measure every point of the grid, handing each result to `emit` as soon as
/// it is produced. Returns the number of points measured.
pub fn run_sweep<K, F, E>(
    config: &MountainConfig,
    measurer: &mut ThroughputMeasurer<K, F>,
    mut emit: E,
) -> Result<usize>
where
    K: AccessKernel,
    F: CycleFitter,
    E: FnMut(MeasurementResult) -> Result<()>,
{
    config.validate()?;
    info!(
        min_bytes = config.min_bytes,
        max_bytes = config.max_bytes,
        max_stride = config.max_stride,
        points = config.measurement_count(),
        "starting sweep"
    );

    let mut measured = 0;
    for ws in SweepPlan::new(config) {
        let result = measurer.measure_result(ws.size_bytes, ws.stride)?;
        emit(result)?;
        measured += 1;
    }

    info!(measured, "sweep complete");
    Ok(measured)
}
