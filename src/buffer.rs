//! The region under test.
//!
//! One `DataBuffer` is allocated at startup, filled once by [`DataBuffer::init`],
//! and only read afterwards. Kernels borrow it; nothing else owns it.

use crate::config::ELEM_SIZE;
use crate::error::{MountainError, Result};

#[derive(Debug)]
pub struct DataBuffer {
    data: Vec<f64>,
}

impl DataBuffer {
    /// Allocate room for `capacity` elements. Contents are zero until `init`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
        }
    }

    /// Allocate room for a working set of `max_bytes`.
    pub fn for_bytes(max_bytes: usize) -> Self {
        Self::with_capacity(max_bytes / ELEM_SIZE)
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Set `data[i] = i` for every `i` in `[0, n)`.
    pub fn init(&mut self, n: usize) -> Result<()> {
        let capacity = self.capacity();
        let prefix = self
            .data
            .get_mut(..n)
            .ok_or(MountainError::CapacityExceeded {
                requested: n,
                capacity,
            })?;

        for (i, slot) in prefix.iter_mut().enumerate() {
            *slot = i as f64;
        }
        Ok(())
    }

    /// Initialize the whole buffer.
    pub fn init_all(&mut self) {
        for (i, slot) in self.data.iter_mut().enumerate() {
            *slot = i as f64;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
