//! Heap-backed block provider.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::block::Block;
use crate::provider::BlockProvider;

/// Acquires blocks from the global heap allocator.
///
/// The portable reference strategy: each acquire is a single allocator call
/// with one fixed [`Layout`], and each release is the matching deallocation.
/// The heap gives no control over placement, so the hint is ignored; chains
/// built over this provider are rarely contiguous, which costs nothing
/// beyond locality.
///
/// # Examples
///
/// ```
/// use ashlar_blocks::{BlockProvider, HeapBlocks};
///
/// let mut heap = HeapBlocks::new(4096);
/// let block = heap.acquire(None).expect("heap allocation failed");
/// assert_eq!(heap.block_size(), 4096);
/// // SAFETY: `block` came from this provider's `acquire`.
/// unsafe { heap.release(block) };
/// ```
#[derive(Debug)]
pub struct HeapBlocks {
    layout: Layout,
}

impl HeapBlocks {
    /// Default block size in bytes.
    ///
    /// Small on purpose: heap blocks are cheap to acquire, so short chains
    /// of small blocks beat one oversized block for typical scratch use.
    pub const DEFAULT_BLOCK_SIZE: usize = 1024;

    /// Default block alignment in bytes.
    ///
    /// The largest fundamental alignment, so any plain-old-data type fits
    /// without asking for more.
    pub const DEFAULT_ALIGN: usize = 16;

    /// Create a provider issuing `block_size`-byte blocks aligned to
    /// [`DEFAULT_ALIGN`](Self::DEFAULT_ALIGN).
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero or does not form a valid [`Layout`]
    /// with the default alignment.
    pub fn new(block_size: usize) -> Self {
        Self::with_align(block_size, Self::DEFAULT_ALIGN)
    }

    /// Create a provider issuing `block_size`-byte blocks aligned to at
    /// least `align`.
    ///
    /// Heap memory can carry any alignment the allocator accepts, so the
    /// storage alignment is configurable here. Arenas over this provider
    /// admit aligned requests up to whatever value is chosen.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero, if `align` is not a power of two, or
    /// if the pair does not form a valid [`Layout`].
    pub fn with_align(block_size: usize, align: usize) -> Self {
        assert!(block_size > 0, "block size must be nonzero");
        let layout = Layout::from_size_align(block_size, align)
            .expect("block size and alignment must form a valid layout");
        Self { layout }
    }
}

impl Default for HeapBlocks {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}

// SAFETY: every block comes from `alloc::alloc` with `self.layout`, which
// is validated at construction and never mutated. Size and alignment are
// therefore stable, and the memory stays valid and exclusive until the
// matching `alloc::dealloc` in `release`.
unsafe impl BlockProvider for HeapBlocks {
    fn block_size(&self) -> usize {
        self.layout.size()
    }

    fn block_align(&self) -> usize {
        self.layout.align()
    }

    fn acquire(&mut self, _hint: Option<NonNull<u8>>) -> Option<Block> {
        // SAFETY: `self.layout` has nonzero size, checked at construction.
        let ptr = unsafe { alloc::alloc(self.layout) };
        let base = NonNull::new(ptr)?;
        // SAFETY: `base` heads a fresh `self.layout` allocation, live and
        // exclusive until released.
        Some(unsafe { Block::new(base) })
    }

    unsafe fn release(&mut self, block: Block) {
        // SAFETY: the caller contract puts `block` on this provider's
        // `acquire`, so its base was allocated with `self.layout` and has
        // not been freed yet.
        unsafe { alloc::dealloc(block.base().as_ptr(), self.layout) }
    }
}
