//! Bounded pool of fixed-size byte buffers.
//!
//! Pre-allocates `pool_size` buffers of exactly `buffer_size` bytes.
//! `acquire` hands out a pooled buffer when one is free, else allocates
//! a fresh one and counts it toward `total` — a soft ceiling, not a
//! hard cap, so the pool never blocks a caller.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_POOL_SIZE: usize = 32;

pub struct BufferPool {
    buffer_size: usize,
    free: Mutex<VecDeque<Vec<u8>>>,
    total: AtomicUsize,
}

impl BufferPool {
    pub fn new(buffer_size: usize, pool_size: usize) -> Self {
        let mut free = VecDeque::with_capacity(pool_size);
        for _ in 0..pool_size {
            free.push_back(vec![0u8; buffer_size]);
        }

        Self {
            buffer_size,
            free: Mutex::new(free),
            total: AtomicUsize::new(pool_size),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Returns a pooled buffer if one is free, otherwise allocates a
    /// new one and grows `total`.
    pub fn acquire(&self) -> Vec<u8> {
        if let Some(buf) = self.free.lock().unwrap().pop_front() {
            return buf;
        }
        self.total.fetch_add(1, Ordering::Relaxed);
        vec![0u8; self.buffer_size]
    }

    /// Returns `buffer` to the pool after zeroing it. Buffers whose
    /// length does not match `buffer_size` are dropped instead of
    /// pooled.
    pub fn release(&self, mut buffer: Vec<u8>) {
        if buffer.len() != self.buffer_size {
            return;
        }
        buffer.iter_mut().for_each(|b| *b = 0);
        self.free.lock().unwrap().push_back(buffer);
    }

    pub fn available(&self) -> usize {
        self.free.lock().unwrap().len()
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE, DEFAULT_POOL_SIZE)
    }
}
