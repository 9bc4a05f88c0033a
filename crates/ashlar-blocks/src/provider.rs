//! The provider capability: acquire and release fixed-size blocks.

use std::ptr::NonNull;

use crate::block::Block;

/// A source of fixed-size memory blocks.
///
/// A provider decides where block memory comes from and how placement hints
/// are treated; consumers (arenas) decide how the bytes inside a block are
/// parcelled out. Providers are stateful and take `&mut self` on both
/// operations, so a provider can track or pool its blocks without interior
/// mutability.
///
/// # Placement hints
///
/// [`acquire`] takes an optional hint: an advisory base address, typically
/// one block size past an existing block, nominating where the next block
/// would extend a chain contiguously. Hints are best-effort in both
/// directions. A backend may ignore the hint outright, and a hinted call
/// may fail where an unhinted one would succeed. Callers must retry without
/// the hint before treating the provider as exhausted.
///
/// # Safety
///
/// Implementations must uphold all of the following for the provider's
/// entire lifetime:
///
/// - Every [`Block`] returned by [`acquire`] refers to [`block_size`] bytes
///   of memory that are valid for reads and writes, aligned to at least
///   [`block_align`], and owned exclusively by the caller until the block
///   is passed back to [`release`].
/// - [`block_size`] returns the same nonzero value on every call, and
///   [`block_align`] returns the same power of two on every call.
/// - [`release`] accepts this provider's outstanding blocks in any order;
///   its own caller contract guarantees each block arrives exactly once.
///
/// [`acquire`]: Self::acquire
/// [`release`]: Self::release
/// [`block_size`]: Self::block_size
/// [`block_align`]: Self::block_align
pub unsafe trait BlockProvider {
    /// Size in bytes of every block this provider issues.
    ///
    /// Fixed at construction; callers cache it freely.
    fn block_size(&self) -> usize;

    /// Minimum guaranteed alignment of every block this provider issues.
    fn block_align(&self) -> usize;

    /// Acquire one block, optionally near `hint`.
    ///
    /// Returns `None` when the backing source cannot supply a block. A
    /// `None` for a hinted request is not final; see the trait docs on
    /// placement hints.
    fn acquire(&mut self, hint: Option<NonNull<u8>>) -> Option<Block>;

    /// Return a previously acquired block to the backing source.
    ///
    /// Blocks may be released in any order. No merging or reuse across
    /// providers is implied; the memory must not be touched afterwards.
    ///
    /// # Safety
    ///
    /// `block` must have been returned by [`acquire`](Self::acquire) on this
    /// same provider and not yet released. Backends deallocate through the
    /// block's base address using their own layout, so a handle minted
    /// elsewhere, moved in from another provider, or released twice reaches
    /// the backing allocator with a pointer it never issued.
    unsafe fn release(&mut self, block: Block);
}
