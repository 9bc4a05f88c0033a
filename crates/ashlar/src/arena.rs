//! The bump arena: an owning block chain with a two-part cursor.

use std::mem;
use std::ptr::NonNull;

use smallvec::SmallVec;

use ashlar_blocks::{Block, BlockProvider, HeapBlocks, PageBlocks};

use crate::error::ArenaError;

/// Number of blocks held inline before the chain spills to the heap.
///
/// Covers the common case of a scratch arena that never grows past a few
/// blocks, so the chain itself does not allocate.
const INLINE_BLOCKS: usize = 4;

/// Round `index` up to the next multiple of `align`.
///
/// Identity for `align == 1` and for indices already aligned.
fn align_up(index: usize, align: usize) -> usize {
    debug_assert!(align > 0, "alignment must be nonzero");
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    let mask = align - 1;
    (index + mask) & !mask
}

/// A bump-pointer arena over provider-supplied blocks.
///
/// The arena owns a growable chain of equally sized [`Block`]s acquired
/// from its provider `P`, plus a cursor split into a block index and a byte
/// offset. Allocation advances the offset; when a request does not fit in
/// the current block's remainder, the arena steps to the next block in the
/// chain, acquiring a fresh one from the provider only when no linked block
/// remains. Requests never straddle a block boundary, so a single
/// allocation is always contiguous.
///
/// [`reset`](Self::reset) rewinds the cursor to the start of the first
/// block without releasing anything, which makes the steady state of a
/// reset-per-cycle workload completely allocation-free: the chain grows to
/// the high-water mark once and is reused from then on. All blocks go back
/// to the provider when the arena is dropped.
///
/// Growing the chain never moves existing blocks, so pointers returned by
/// the allocation methods stay valid until the next [`reset`](Self::reset)
/// or until the arena is dropped. The arena does not track that lifetime;
/// callers are handed raw [`NonNull`] pointers and own the window in which
/// they dereference them. Values stored here must not need dropping, which
/// [`store`](Self::store) enforces at compile time.
///
/// An arena is single-owner by construction: all methods take `&mut self`,
/// and holding [`Block`]s makes it `!Send` and `!Sync`.
///
/// # Examples
///
/// ```
/// use ashlar::{Arena, HeapBlocks};
///
/// let mut arena = Arena::with_provider(HeapBlocks::new(1024))?;
/// let first = arena.alloc(100)?;
/// let second = arena.alloc(100)?;
/// assert_ne!(first, second);
///
/// // Rewind and reuse the same memory for the next cycle.
/// arena.reset();
/// assert_eq!(arena.alloc(1)?, first);
/// # Ok::<(), ashlar::ArenaError>(())
/// ```
#[derive(Debug)]
pub struct Arena<P: BlockProvider> {
    provider: P,
    /// Owned block chain; `blocks[0]` is acquired at construction and the
    /// chain only ever grows.
    blocks: SmallVec<[Block; INLINE_BLOCKS]>,
    /// Index of the block the cursor currently points into.
    head: usize,
    /// Byte offset of the next free byte within `blocks[head]`.
    cursor: usize,
    /// Cached `provider.block_size()`.
    block_size: usize,
    /// Cached `provider.block_align()`.
    block_align: usize,
}

/// Arena over the heap-backed provider; the portable default.
pub type HeapArena = Arena<HeapBlocks>;

/// Arena over the OS-page-backed provider.
pub type PageArena = Arena<PageBlocks>;

impl<P: BlockProvider> Arena<P> {
    /// Create an arena over `provider`, acquiring the first block eagerly.
    ///
    /// Eager acquisition means a successfully constructed arena always has
    /// at least one block, and the allocation fast path never has to ask
    /// whether the chain is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ProviderExhausted`] if the provider cannot
    /// supply the initial block.
    pub fn with_provider(mut provider: P) -> Result<Self, ArenaError> {
        let block_size = provider.block_size();
        let block_align = provider.block_align();
        debug_assert!(block_size > 0, "provider reported a zero block size");
        debug_assert!(
            block_align.is_power_of_two(),
            "provider reported a non-power-of-two block alignment"
        );
        let first = provider
            .acquire(None)
            .ok_or(ArenaError::ProviderExhausted {
                block_size,
                blocks_held: 0,
            })?;
        let mut blocks = SmallVec::new();
        blocks.push(first);
        Ok(Self {
            provider,
            blocks,
            head: 0,
            cursor: 0,
            block_size,
            block_align,
        })
    }

    /// Allocate `size` bytes with no alignment guarantee.
    ///
    /// Zero-size requests are bumped to one byte so that every call returns
    /// a distinct address. On error the arena is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OversizedRequest`] if `size` exceeds
    /// [`max_allocation_size`](Self::max_allocation_size), and
    /// [`ArenaError::ProviderExhausted`] if a new block was needed and the
    /// provider could not supply one.
    pub fn alloc(&mut self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let size = size.max(1);
        if size > self.block_size {
            return Err(ArenaError::OversizedRequest {
                requested: size,
                max: self.block_size,
            });
        }
        // SAFETY: `size` is in `1..=block_size`, checked above.
        unsafe { self.alloc_unchecked(size) }
    }

    /// Allocate `size` bytes aligned to `align`.
    ///
    /// Pads the cursor up to the next multiple of `align` first; if the
    /// padded request no longer fits in the current block it is placed at
    /// the start of the next one, where offset zero satisfies any
    /// admissible alignment. The padding bytes are simply skipped, not
    /// returned by any other allocation.
    ///
    /// # Errors
    ///
    /// Same failure cases as [`alloc`](Self::alloc).
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two or exceeds
    /// [`block_align`](Self::block_align). Both are structural misuse, not
    /// runtime conditions, so they are not represented in [`ArenaError`].
    pub fn alloc_aligned(&mut self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        assert!(
            align.is_power_of_two(),
            "alignment {align} is not a power of two"
        );
        assert!(
            align <= self.block_align,
            "alignment {align} exceeds the block alignment {}",
            self.block_align
        );
        let size = size.max(1);
        if size > self.block_size {
            return Err(ArenaError::OversizedRequest {
                requested: size,
                max: self.block_size,
            });
        }
        // SAFETY: size and alignment were checked above.
        unsafe { self.alloc_aligned_unchecked(size, align) }
    }

    /// Allocate `size` bytes without validating the request.
    ///
    /// The trusted twin of [`alloc`](Self::alloc) for callers that have
    /// already bounded their request sizes: it skips the oversize check and
    /// goes straight to the bump path.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ProviderExhausted`] if a new block was needed
    /// and the provider could not supply one.
    ///
    /// # Safety
    ///
    /// `size` must be in `1..=block_size()`. A larger size corrupts the
    /// cursor and leads to out-of-bounds pointers on later allocations.
    pub unsafe fn alloc_unchecked(&mut self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        debug_assert!(size >= 1, "unchecked allocation of zero bytes");
        debug_assert!(
            size <= self.block_size,
            "unchecked allocation of {size} bytes exceeds the block size {}",
            self.block_size
        );
        if size > self.block_size - self.cursor {
            self.advance()?;
        }
        let ptr = self.head_ptr(self.cursor);
        self.cursor += size;
        if self.cursor >= self.block_size {
            self.advance_into_linked();
        }
        Ok(ptr)
    }

    /// Allocate `size` bytes aligned to `align`, without validating either.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ProviderExhausted`] if a new block was needed
    /// and the provider could not supply one.
    ///
    /// # Safety
    ///
    /// `size` must be in `1..=block_size()`, and `align` must be a power of
    /// two no greater than [`block_align`](Self::block_align).
    pub unsafe fn alloc_aligned_unchecked(
        &mut self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        debug_assert!(size >= 1, "unchecked allocation of zero bytes");
        debug_assert!(
            size <= self.block_size,
            "unchecked allocation of {size} bytes exceeds the block size {}",
            self.block_size
        );
        debug_assert!(
            align.is_power_of_two() && align <= self.block_align,
            "unchecked alignment {align} is not admissible"
        );
        let mut start = align_up(self.cursor, align);
        if start + size > self.block_size {
            self.advance()?;
            // Block bases are aligned to at least `block_align`, so offset
            // zero satisfies `align` without padding.
            start = 0;
        }
        let ptr = self.head_ptr(start);
        self.cursor = start + size;
        if self.cursor >= self.block_size {
            self.advance_into_linked();
        }
        Ok(ptr)
    }

    /// Move `value` into the arena and return a typed pointer to it.
    ///
    /// The slot is aligned for `T` and sized `size_of::<T>()` (one byte for
    /// zero-sized types, so distinct stores keep distinct addresses). The
    /// value is written in place and never dropped by the arena, which is
    /// why `T` must be trivially destructible; that bound is enforced at
    /// compile time.
    ///
    /// # Errors
    ///
    /// Same failure cases as [`alloc`](Self::alloc).
    ///
    /// # Panics
    ///
    /// Panics if `align_of::<T>()` exceeds [`block_align`](Self::block_align).
    ///
    /// # Examples
    ///
    /// ```
    /// use ashlar::HeapArena;
    ///
    /// let mut arena = HeapArena::with_block_size(1024)?;
    /// let point = arena.store([1.0f32, 2.0, 3.0])?;
    /// // SAFETY: just stored; the arena has not been reset or dropped.
    /// assert_eq!(unsafe { point.as_ref() }[1], 2.0);
    /// # Ok::<(), ashlar::ArenaError>(())
    /// ```
    pub fn store<T>(&mut self, value: T) -> Result<NonNull<T>, ArenaError> {
        const {
            assert!(
                !mem::needs_drop::<T>(),
                "arena-stored types must not need dropping; the arena never runs destructors"
            )
        };
        let align = mem::align_of::<T>();
        assert!(
            align <= self.block_align,
            "alignment {align} of the stored type exceeds the block alignment {}",
            self.block_align
        );
        let size = mem::size_of::<T>().max(1);
        if size > self.block_size {
            return Err(ArenaError::OversizedRequest {
                requested: size,
                max: self.block_size,
            });
        }
        // SAFETY: size was checked above and `align_of` is always an
        // admissible power of two here.
        let ptr = unsafe { self.alloc_aligned_unchecked(size, align)? }.cast::<T>();
        // SAFETY: the slot is valid for writes of `size_of::<T>()` bytes
        // and meets `T`'s alignment.
        unsafe { ptr.as_ptr().write(value) };
        Ok(ptr)
    }

    /// Rewind the cursor to the start of the first block.
    ///
    /// Nothing is released: the chain keeps every block it has grown, so
    /// later cycles refill the same memory without touching the provider.
    /// All previously returned pointers are invalidated; the old bytes are
    /// left as they were until overwritten.
    pub fn reset(&mut self) {
        self.head = 0;
        self.cursor = 0;
    }

    /// Whether a request of `size` bytes at alignment `align` can ever
    /// succeed on this arena, regardless of its current fill level.
    ///
    /// This is the query form of the checks [`alloc`](Self::alloc) and
    /// [`alloc_aligned`](Self::alloc_aligned) perform, with the panics
    /// folded into `false`.
    pub fn fits(&self, size: usize, align: usize) -> bool {
        align.is_power_of_two() && align <= self.block_align && size.max(1) <= self.block_size
    }

    /// Size in bytes of every block in the chain.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Largest single request this arena can satisfy.
    ///
    /// Equal to [`block_size`](Self::block_size): blocks carry no in-band
    /// bookkeeping, so the whole block is usable by one request.
    pub fn max_allocation_size(&self) -> usize {
        self.block_size
    }

    /// Guaranteed minimum alignment of every block base, and therefore the
    /// upper bound accepted by [`alloc_aligned`](Self::alloc_aligned).
    pub fn block_align(&self) -> usize {
        self.block_align
    }

    /// Number of blocks currently in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes consumed in this cycle, counting alignment padding and the
    /// unused tails of blocks the cursor has moved past.
    pub fn used_bytes(&self) -> usize {
        self.head * self.block_size + self.cursor
    }

    /// Total bytes of block storage held, used or not.
    pub fn memory_bytes(&self) -> usize {
        self.blocks.len() * self.block_size
    }

    /// Pointer `offset` bytes into the current block.
    fn head_ptr(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(
            offset < self.block_size,
            "offset {offset} outside the current block"
        );
        // SAFETY: `offset` is within the block and the provider guarantees
        // the block's validity while it is held.
        unsafe { self.blocks[self.head].base().add(offset) }
    }

    /// Move the cursor to the start of the next block, appending a fresh
    /// one if the chain has no next block. On failure the cursor is
    /// untouched.
    fn advance(&mut self) -> Result<(), ArenaError> {
        if self.head + 1 == self.blocks.len() {
            self.append()?;
        }
        self.head += 1;
        self.cursor = 0;
        Ok(())
    }

    /// Step into the next block only if one is already linked.
    ///
    /// Used after an allocation lands exactly on a block boundary: the
    /// cursor should not rest in a full block, but finishing a request that
    /// already succeeded must not acquire anything either. At the chain
    /// tail the cursor stays put and the next allocation appends.
    fn advance_into_linked(&mut self) {
        if self.head + 1 < self.blocks.len() {
            self.head += 1;
            self.cursor = 0;
        }
    }

    /// Acquire one block and link it at the end of the chain.
    ///
    /// The provider is hinted at the address one block past the current
    /// block's base, nominating a contiguous extension, and retried without
    /// the hint before the arena gives up.
    fn append(&mut self) -> Result<(), ArenaError> {
        debug_assert!(
            self.head + 1 == self.blocks.len(),
            "appending while linked blocks remain unused"
        );
        // SAFETY: one-past-the-end of a live block is a valid address to
        // compute; it is only ever passed on as a hint, never dereferenced.
        let hint = unsafe { self.blocks[self.head].base().add(self.block_size) };
        let block = self
            .provider
            .acquire(Some(hint))
            .or_else(|| self.provider.acquire(None))
            .ok_or(ArenaError::ProviderExhausted {
                block_size: self.block_size,
                blocks_held: self.blocks.len(),
            })?;
        self.blocks.push(block);
        Ok(())
    }
}

impl Arena<HeapBlocks> {
    /// Heap-backed arena with `block_size`-byte blocks.
    ///
    /// Shorthand for [`with_provider`](Self::with_provider) over
    /// [`HeapBlocks::new`].
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ProviderExhausted`] if the initial block
    /// cannot be allocated.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn with_block_size(block_size: usize) -> Result<Self, ArenaError> {
        Self::with_provider(HeapBlocks::new(block_size))
    }
}

impl<P: BlockProvider> Drop for Arena<P> {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            // SAFETY: every block in the chain came from `self.provider`'s
            // `acquire`, and draining hands each one over exactly once.
            unsafe { self.provider.release(block) };
        }
    }
}
