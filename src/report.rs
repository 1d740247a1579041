use std::io::Write;

use crate::error::Result;
use crate::measure::MeasurementResult;

/// Writes `<size> <stride> <MB/s>` lines, bandwidth to one decimal place.
pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, result: &MeasurementResult) -> Result<()> {
        writeln!(
            self.out,
            "{} {} {:.1}",
            result.size_bytes, result.stride, result.bandwidth_mbps
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
