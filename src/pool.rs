//! Reusable encode buffers.
//!
//! Buffers are zeroized and cleared on return, so nothing from one response
//! can surface in the next. Oversized buffers are dropped instead of pooled.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use zeroize::Zeroize;

const DEFAULT_MAX_POOLED: usize = 32;
const DEFAULT_MAX_CAPACITY: usize = 1 << 20;

/// Shared pool of byte buffers. Clones share storage.
#[derive(Debug, Clone)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<Vec<u8>>>>,
    max_pooled: usize,
    max_capacity: usize,
}

impl BufferPool {
    /// Keep at most `max_pooled` buffers of at most `max_capacity` bytes.
    pub fn new(max_pooled: usize, max_capacity: usize) -> Self {
        Self {
            free: Arc::new(Mutex::new(Vec::with_capacity(max_pooled))),
            max_pooled,
            max_capacity,
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Take an empty buffer, reusing a pooled one when available.
    pub fn acquire(&self) -> PooledBuffer {
        let buffer = self.lock().pop().unwrap_or_default();
        PooledBuffer {
            buffer,
            pool: self.clone(),
        }
    }

    fn release(&self, mut buffer: Vec<u8>) {
        buffer.zeroize();
        if buffer.capacity() > self.max_capacity {
            return;
        }
        let mut free = self.lock();
        if free.len() < self.max_pooled {
            free.push(buffer);
        }
    }

    /// Buffers currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POOLED, DEFAULT_MAX_CAPACITY)
    }
}

/// A buffer on loan from a [`BufferPool`]; returned on drop.
#[derive(Debug)]
pub struct PooledBuffer {
    buffer: Vec<u8>,
    pool: BufferPool,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
