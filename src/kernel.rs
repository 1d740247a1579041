//! The timed unit: a strided walk over the first `elems` elements.
//!
//! Both kernels return the accumulated sum and the caller hands it to
//! `std::hint::black_box`, so the loads cannot be proven dead and dropped.

use tracing::debug;

use crate::buffer::DataBuffer;
use crate::config::{KernelMode, MountainConfig};
use crate::error::{MountainError, Result};
use crate::line_reader::FileLineReader;

pub trait AccessKernel {
    /// Visit indices `0, stride, 2*stride, ...` below `elems` and return the
    /// sum of the values read.
    fn touch(&self, elems: usize, stride: usize) -> Result<f64>;

    /// Largest `elems` this kernel accepts, if bounded.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryKernel<'a> {
    data: &'a [f64],
}

impl<'a> MemoryKernel<'a> {
    pub fn new(buffer: &'a DataBuffer) -> Self {
        Self {
            data: buffer.as_slice(),
        }
    }
}

impl AccessKernel for MemoryKernel<'_> {
    #[inline]
    fn touch(&self, elems: usize, stride: usize) -> Result<f64> {
        if stride == 0 {
            return Err(MountainError::ZeroStride);
        }
        let prefix = self
            .data
            .get(..elems)
            .ok_or(MountainError::CapacityExceeded {
                requested: elems,
                capacity: self.data.len(),
            })?;

        let mut sum = 0.0;
        for value in prefix.iter().step_by(stride) {
            sum += *value;
        }
        Ok(sum)
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.data.len())
    }
}

/// Index `i` of the walk reads line `i + 1` of the backing file.
#[derive(Debug, Clone)]
pub struct DiskKernel {
    reader: FileLineReader,
}

impl DiskKernel {
    pub fn new(reader: FileLineReader) -> Self {
        Self { reader }
    }
}

impl AccessKernel for DiskKernel {
    fn touch(&self, elems: usize, stride: usize) -> Result<f64> {
        if stride == 0 {
            return Err(MountainError::ZeroStride);
        }

        let mut sum = 0.0;
        for i in (0..elems).step_by(stride) {
            match self.reader.read_line(i + 1) {
                Ok(value) => sum += value as f64,
                // Already warned by the reader; a missing or malformed line
                // adds nothing.
                Err(err) if err.is_recoverable() => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(sum)
    }
}

/// Kernel picked by [`KernelMode`].
#[derive(Debug, Clone)]
pub enum Kernel<'a> {
    Memory(MemoryKernel<'a>),
    Disk(DiskKernel),
}

impl<'a> Kernel<'a> {
    pub fn for_config(config: &MountainConfig, buffer: &'a DataBuffer) -> Self {
        debug!(mode = ?config.mode, "selecting access kernel");
        match config.mode {
            KernelMode::MemoryBacked => Kernel::Memory(MemoryKernel::new(buffer)),
            KernelMode::DiskBacked => {
                Kernel::Disk(DiskKernel::new(FileLineReader::new(&config.input_path)))
            }
        }
    }
}

impl AccessKernel for Kernel<'_> {
    #[inline]
    fn touch(&self, elems: usize, stride: usize) -> Result<f64> {
        match self {
            Kernel::Memory(kernel) => kernel.touch(elems, stride),
            Kernel::Disk(kernel) => kernel.touch(elems, stride),
        }
    }

    fn capacity(&self) -> Option<usize> {
        match self {
            Kernel::Memory(kernel) => kernel.capacity(),
            Kernel::Disk(kernel) => kernel.capacity(),
        }
    }
}

impl<K: AccessKernel + ?Sized> AccessKernel for &K {
    #[inline]
    fn touch(&self, elems: usize, stride: usize) -> Result<f64> {
        (**self).touch(elems, stride)
    }

    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }
}
