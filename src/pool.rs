// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For recycling subframe sample buffers

use std::sync::{Arc, Mutex};

/// A shared free-list of sample buffers
///
/// Clones refer to the same free-list.
/// Buffers acquired from the pool return to it
/// when dropped, whether or not decoding succeeded.
///
/// # Example
/// ```
/// use flac_subframe::pool::SamplePool;
///
/// let pool = SamplePool::new();
/// let samples = pool.acquire(4096);
/// assert_eq!(samples.len(), 4096);
/// assert_eq!(pool.idle(), 0);
/// drop(samples);
/// assert_eq!(pool.idle(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct SamplePool {
    free: Arc<Mutex<Vec<Vec<i32>>>>,
    max_idle: usize,
}

impl SamplePool {
    /// Default number of idle buffers kept for reuse
    ///
    /// Enough for one frame of 8 channels.
    pub const DEFAULT_MAX_IDLE: usize = 8;

    /// Builds an empty pool
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_IDLE)
    }

    /// Builds an empty pool which keeps at most `max_idle` idle buffers
    pub fn with_capacity(max_idle: usize) -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::with_capacity(max_idle))),
            max_idle,
        }
    }

    /// Returns a zero-filled buffer of `len` samples
    pub fn acquire(&self, len: usize) -> Samples {
        let mut buf = self
            .free
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_default();

        buf.clear();
        buf.resize(len, 0);

        Samples {
            buf,
            pool: Some(self.clone()),
        }
    }

    /// Number of buffers waiting to be reused
    pub fn idle(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or_default()
    }

    fn release(&self, buf: Vec<i32>) {
        // a poisoned free-list only costs us the reuse
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.max_idle {
                free.push(buf);
            }
        }
    }
}

impl Default for SamplePool {
    fn default() -> Self {
        Self::new()
    }
}

/// An owned buffer of decoded samples
///
/// If acquired from a [`SamplePool`],
/// its storage goes back to the pool on drop.
#[derive(Debug, Default)]
pub struct Samples {
    buf: Vec<i32>,
    pool: Option<SamplePool>,
}

impl Samples {
    /// Returns a zero-filled buffer of `len` samples not tied to any pool
    pub fn unpooled(len: usize) -> Self {
        Self {
            buf: vec![0; len],
            pool: None,
        }
    }

    /// Returns a buffer from the given pool, if any
    pub(crate) fn acquire(pool: Option<&SamplePool>, len: usize) -> Self {
        match pool {
            Some(pool) => pool.acquire(len),
            None => Self::unpooled(len),
        }
    }
}

impl std::ops::Deref for Samples {
    type Target = [i32];

    #[inline]
    fn deref(&self) -> &[i32] {
        &self.buf
    }
}

impl std::ops::DerefMut for Samples {
    #[inline]
    fn deref_mut(&mut self) -> &mut [i32] {
        &mut self.buf
    }
}

impl Drop for Samples {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(std::mem::take(&mut self.buf));
        }
    }
}
