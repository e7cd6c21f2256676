//! Nibble memory: a block arena for decoded payloads
//!
//! An [`Nmem`] carves allocations out of large blocks with a bump pointer and
//! never frees them individually. All allocations of one generation are
//! released together by [`Nmem::reset`], which hands the blocks back to a
//! [`BlockPool`] so the next decode cycle can reuse them without going back
//! to the system allocator.
//!
//! # Safety model
//!
//! Regions are handed out as [`BytesMut`]/[`Bytes`] views that share the
//! block's allocation by reference count. A reset therefore never leaves a
//! caller with a dangling view: a block that is still referenced simply
//! cannot be reclaimed by the pool and a fresh block is allocated instead.
//!
//! # Concurrency
//!
//! An arena belongs to one handle and is used without locking. The pool is
//! the only shared structure; it is guarded by a mutex and may be shared
//! between arenas on different threads via `Arc`.

use crate::config::DEFAULT_MEM_BLOCK_SIZE;
use crate::error::{OdrError, OdrErrorCode, OdrResult};
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::sync::Arc;

/// Alignment of every allocation relative to the start of its block
pub const NMEM_ALIGN: usize = 8;

/// Default upper bound on blocks kept by a pool
pub const DEFAULT_POOL_CAPACITY: usize = 64;

fn align_up(size: usize) -> Option<usize> {
    size.checked_add(NMEM_ALIGN - 1).map(|s| s & !(NMEM_ALIGN - 1))
}

/// Free list of arena blocks shared between arenas
#[derive(Debug)]
pub struct BlockPool {
    free: Mutex<Vec<BytesMut>>,
    capacity: usize,
}

impl BlockPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Create a pool keeping at most `capacity` idle blocks
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Number of idle blocks currently held
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Get a block with room for at least `size` bytes
    ///
    /// An idle block is reused when its allocation is no longer referenced
    /// by any outstanding view and is large enough; otherwise a new block is
    /// allocated.
    fn take(&self, size: usize) -> BytesMut {
        let mut free = self.free.lock();
        let found = free.iter_mut().position(|block| {
            block.clear();
            block.try_reclaim(size)
        });
        match found {
            Some(index) => {
                log::trace!("nmem: reusing pooled block for {} bytes", size);
                free.swap_remove(index)
            }
            None => {
                log::trace!("nmem: allocating new block of {} bytes", size);
                BytesMut::with_capacity(size)
            }
        }
    }

    fn put(&self, blocks: impl IntoIterator<Item = BytesMut>) {
        let mut free = self.free.lock();
        for mut block in blocks {
            if free.len() >= self.capacity {
                break;
            }
            block.clear();
            free.push(block);
        }
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Bump-pointer block arena
#[derive(Debug)]
pub struct Nmem {
    /// Blocks of this generation; the last one is the current block
    blocks: Vec<BytesMut>,
    total: usize,
    generation: u64,
    block_size: usize,
    limit: Option<usize>,
    pool: Arc<BlockPool>,
}

impl Nmem {
    /// Create an arena with a private pool and default block size
    pub fn new() -> Self {
        Self::with_pool(Arc::new(BlockPool::new()), DEFAULT_MEM_BLOCK_SIZE, None)
    }

    /// Create an arena drawing blocks from a shared pool
    ///
    /// # Arguments
    /// * `pool` - Pool that blocks are taken from and returned to on reset
    /// * `block_size` - Minimum size of each block
    /// * `limit` - Upper bound on bytes allocated per generation
    pub fn with_pool(pool: Arc<BlockPool>, block_size: usize, limit: Option<usize>) -> Self {
        Self {
            blocks: Vec::new(),
            total: 0,
            generation: 0,
            block_size: block_size.max(NMEM_ALIGN),
            limit,
            pool,
        }
    }

    /// Allocate a zero-filled writable region of `size` bytes
    ///
    /// # Errors
    /// Returns [`OdrErrorCode::Memory`] when the allocation would exceed the
    /// configured limit.
    pub fn malloc(&mut self, size: usize) -> OdrResult<BytesMut> {
        let padded = align_up(size).ok_or_else(|| self.exhausted(size))?;
        if let Some(limit) = self.limit {
            if self.total.saturating_add(padded) > limit {
                return Err(self.exhausted(size));
            }
        }

        let fits = self
            .blocks
            .last()
            .is_some_and(|block| block.capacity() >= padded);
        if !fits {
            let block = self.pool.take(padded.max(self.block_size));
            self.blocks.push(block);
        }

        let block = self
            .blocks
            .last_mut()
            .ok_or_else(|| OdrError::new(OdrErrorCode::Memory))?;
        block.resize(padded, 0);
        let mut region = block.split_to(padded);
        region.truncate(size);
        self.total += padded;
        Ok(region)
    }

    /// Copy `data` into the arena
    pub fn memdup(&mut self, data: &[u8]) -> OdrResult<Bytes> {
        let mut region = self.malloc(data.len())?;
        region.copy_from_slice(data);
        Ok(region.freeze())
    }

    /// Copy the UTF-8 octets of `text` into the arena
    pub fn strdup(&mut self, text: &str) -> OdrResult<Bytes> {
        self.memdup(text.as_bytes())
    }

    /// Release all allocations of the current generation
    ///
    /// Blocks go back to the pool; views handed out earlier stay valid but
    /// keep their block out of circulation until they are dropped.
    pub fn reset(&mut self) {
        self.pool.put(self.blocks.drain(..));
        self.total = 0;
        self.generation += 1;
    }

    /// Release the arena and everything it owns
    pub fn destroy(self) {
        drop(self);
    }

    /// Move all blocks of `src` into `dst` without copying
    ///
    /// Allocation in `dst` continues in its own current block.
    pub fn transfer(dst: &mut Nmem, src: &mut Nmem) {
        let current = dst.blocks.pop();
        dst.blocks.append(&mut src.blocks);
        dst.blocks.extend(current);
        dst.total += src.total;
        src.total = 0;
    }

    /// Bytes allocated in the current generation, including alignment padding
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of resets performed so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of blocks owned by the current generation
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The pool this arena recycles blocks into
    pub fn pool(&self) -> &Arc<BlockPool> {
        &self.pool
    }

    fn exhausted(&self, size: usize) -> OdrError {
        OdrError::new(OdrErrorCode::Memory).with_addinfo(format!(
            "nmem: {} bytes requested with {} bytes in use (limit {:?})",
            size, self.total, self.limit
        ))
    }
}

impl Default for Nmem {
    fn default() -> Self {
        Self::new()
    }
}
