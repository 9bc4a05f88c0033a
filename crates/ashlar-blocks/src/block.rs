//! The raw memory block handed between a provider and its caller.

use std::fmt;
use std::ptr::NonNull;

/// An acquired, fixed-size region of raw memory.
///
/// Blocks are issued by [`BlockProvider::acquire`] and consumed by
/// [`BlockProvider::release`]; in between, the holder has exclusive use of
/// the region. A block does not carry its own size or alignment: both are
/// fixed properties of the provider that issued it, reported by
/// [`BlockProvider::block_size`] and [`BlockProvider::block_align`].
///
/// Wrapping [`NonNull`] keeps the null case unrepresentable and makes any
/// structure holding blocks `!Send` and `!Sync`, which matches the
/// single-owner contract: a block is mutated through raw pointers and must
/// not be shared across threads.
///
/// [`BlockProvider::acquire`]: crate::BlockProvider::acquire
/// [`BlockProvider::release`]: crate::BlockProvider::release
/// [`BlockProvider::block_size`]: crate::BlockProvider::block_size
/// [`BlockProvider::block_align`]: crate::BlockProvider::block_align
pub struct Block {
    base: NonNull<u8>,
}

impl Block {
    /// Wrap the base address of an acquired region.
    ///
    /// For [`BlockProvider`](crate::BlockProvider) implementations building
    /// the return value of their `acquire`.
    ///
    /// # Safety
    ///
    /// `base` must point to a live region that meets the issuing provider's
    /// size, alignment, and exclusivity guarantees. Holders read and write
    /// through the handle, and
    /// [`release`](crate::BlockProvider::release) deallocates through it.
    pub unsafe fn new(base: NonNull<u8>) -> Self {
        Self { base }
    }

    /// Base address of the region.
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({:p})", self.base.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use crate::heap::HeapBlocks;
    use crate::provider::BlockProvider;

    #[test]
    fn base_is_stable_across_moves() {
        let mut heap = HeapBlocks::new(64);
        let block = heap.acquire(None).expect("acquire failed");
        let base = block.base();
        let moved = block;
        assert_eq!(moved.base(), base);
        // SAFETY: acquired from `heap` above, released exactly once.
        unsafe { heap.release(moved) };
    }

    #[test]
    fn debug_formats_as_address() {
        let mut heap = HeapBlocks::new(64);
        let block = heap.acquire(None).expect("acquire failed");
        let rendered = format!("{block:?}");
        assert!(rendered.starts_with("Block(0x"), "got {rendered}");
        // SAFETY: acquired from `heap` above, released exactly once.
        unsafe { heap.release(block) };
    }
}
