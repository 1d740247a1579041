//! Memory mountain: read bandwidth as a function of working-set size and
//! access stride.
//!
//! ```text
//!   run_sweep ──► ThroughputMeasurer ──► AccessKernel ──► DataBuffer
//!                       │                     └─────────► FileLineReader
//!                       └──► CycleFitter / Clock
//! ```
//!
//! The binary sweeps 2 KB .. 32 MB by strides 1 .. 64 and prints one
//! `<size> <stride> <MB/s>` line per point.

pub mod buffer;
pub mod config;
pub mod error;
pub mod kernel;
pub mod line_reader;
pub mod measure;
pub mod report;
pub mod sweep;
pub mod timing;

use std::io::Write;

use tracing::info;

pub use buffer::DataBuffer;
pub use config::{KernelMode, MountainConfig};
pub use error::{LineError, MountainError, Result};
pub use kernel::{AccessKernel, DiskKernel, Kernel, MemoryKernel};
pub use line_reader::FileLineReader;
pub use measure::{MeasurementResult, ThroughputMeasurer};
pub use report::Report;
pub use sweep::{run_sweep, SweepPlan, WorkingSet};
pub use timing::{Clock, CycleFitter, FixedClock, KBestConfig, KBestFitter, TscClock};

/// Allocate and fill the buffer, calibrate once, then sweep `config`,
/// writing each result to `out` as it is measured.
pub fn run_mountain<C, F, W>(config: &MountainConfig, clock: &C, fitter: F, out: W) -> Result<usize>
where
    C: Clock,
    F: CycleFitter,
    W: Write,
{
    config.validate()?;

    let mut buffer = DataBuffer::for_bytes(config.max_bytes);
    buffer.init_all();

    let mhz = clock.estimate_frequency_mhz()?;
    info!(mhz, "clock frequency estimated");

    let kernel = Kernel::for_config(config, &buffer);
    let mut measurer = ThroughputMeasurer::new(kernel, fitter, mhz);
    let mut report = Report::new(out);
    let measured = run_sweep(config, &mut measurer, |result| report.write(&result))?;
    report.finish()?;
    Ok(measured)
}
