//! Execution resources for the pipeline kernels.
//!
//! `DeviceBuffer` is an owned, explicitly-sized allocation addressed as an
//! opaque handle plus a byte length; stages exchange buffers, never borrowed
//! iterators, and host code sees contents only through the explicit copy
//! calls. `Stream` is a non-owning queue token copied by value into every
//! kernel launch.
//!
//! Kernels execute on the rayon thread pool. A launch completes its work
//! before returning, so operations issued on one stream trivially complete
//! in issue order and `Stream::synchronize` is an ordering marker for the
//! host-side observation points rather than a wait.

use crate::error::{Error, Result};

/// An allocation owned by the execution backend.
#[derive(Debug)]
pub struct DeviceBuffer<T> {
    data: Vec<T>,
}

impl<T> Default for DeviceBuffer<T> {
    fn default() -> Self {
        DeviceBuffer { data: Vec::new() }
    }
}

impl<T: Copy + Default + Send + Sync> DeviceBuffer<T> {
    /// Allocate a zero-initialized buffer of `len` elements.
    pub fn alloc(len: usize) -> Self {
        DeviceBuffer {
            data: vec![T::default(); len],
        }
    }

    /// Allocate and fill from host memory.
    pub fn from_host(src: &[T]) -> Self {
        DeviceBuffer { data: src.to_vec() }
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Explicit byte length of the allocation.
    pub fn nbyte(&self) -> usize {
        self.data.len() * core::mem::size_of::<T>()
    }

    /// Kernel-side view. Host-side stage code must go through the copy
    /// calls instead.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable kernel-side view.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Overwrite every element.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Copy the full buffer into host memory.
    pub fn copy_to_host(&self, dst: &mut [T]) -> Result<()> {
        if dst.len() < self.data.len() {
            return Err(Error::device(
                "copy",
                format!("host buffer {} short of {}", dst.len(), self.data.len()),
            ));
        }
        dst[..self.data.len()].copy_from_slice(&self.data);
        Ok(())
    }

    /// Copy the full buffer into a fresh host vector.
    pub fn to_host(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Overwrite the buffer prefix from host memory.
    pub fn copy_from_host(&mut self, src: &[T]) -> Result<()> {
        if src.len() > self.data.len() {
            return Err(Error::device(
                "copy",
                format!("source {} exceeds buffer {}", src.len(), self.data.len()),
            ));
        }
        self.data[..src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// A queue token establishing issue order between kernel launches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stream(u32);

impl Stream {
    /// Create a stream with an explicit id.
    pub fn new(id: u32) -> Self {
        Stream(id)
    }

    /// Stream id, for diagnostics.
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Host-side barrier: returns once every launch issued on this stream
    /// has drained. On the thread-pool backend a launch drains before its
    /// call returns, so this marks the observation point and nothing else.
    pub fn synchronize(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_zeroes_and_reports_bytes() {
        let buf = DeviceBuffer::<u16>::alloc(10);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.nbyte(), 20);
        assert!(buf.to_host().iter().all(|&v| v == 0));
    }

    #[test]
    fn host_round_trip() {
        let src = [1.0f32, -2.5, 3.25];
        let buf = DeviceBuffer::from_host(&src);
        let mut dst = [0.0f32; 3];
        buf.copy_to_host(&mut dst).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn short_host_buffer_is_an_error() {
        let buf = DeviceBuffer::<u8>::alloc(4);
        let mut dst = [0u8; 2];
        assert!(buf.copy_to_host(&mut dst).is_err());

        let mut buf = DeviceBuffer::<u8>::alloc(2);
        assert!(buf.copy_from_host(&[0u8; 4]).is_err());
    }

    #[test]
    fn streams_are_plain_tokens() {
        let s = Stream::new(3);
        let t = s; // copied by value, non-owning
        assert_eq!(s, t);
        s.synchronize();
    }
}
