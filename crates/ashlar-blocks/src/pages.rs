//! OS-page-backed block provider.

use std::ptr::NonNull;

use crate::block::Block;
use crate::provider::BlockProvider;

/// Acquires blocks directly from the operating system's virtual memory
/// subsystem, bypassing the global allocator.
///
/// Each block is a whole number of pages, mapped readable and writable in a
/// single reserve-and-commit step and pre-zeroed by the OS. The block size
/// requested at construction is rounded up to the system page size, and the
/// rounded value is what [`BlockProvider::block_size`] reports from then on.
///
/// Placement hints are forwarded to the OS as the desired base address. On
/// Unix, `mmap` treats the address as advisory and placing the mapping
/// elsewhere still counts as success. On Windows, `VirtualAlloc` fails
/// outright when the hinted range is unavailable; callers absorb that by
/// retrying without a hint, per the [`BlockProvider`] contract.
///
/// # Examples
///
/// ```
/// use ashlar_blocks::{BlockProvider, PageBlocks};
///
/// let mut pages = PageBlocks::new(1);
/// // Rounded up to one full page.
/// assert_eq!(pages.block_size(), pages.page_size());
/// let block = pages.acquire(None).expect("mapping failed");
/// // SAFETY: `block` came from this provider's `acquire`.
/// unsafe { pages.release(block) };
/// ```
#[derive(Debug)]
pub struct PageBlocks {
    block_size: usize,
    page_size: usize,
}

impl PageBlocks {
    /// Default block size in bytes: 2 MiB.
    ///
    /// Mapping syscalls are much slower than heap allocation, so page
    /// blocks default to a far coarser granule than heap blocks.
    pub const DEFAULT_BLOCK_SIZE: usize = 2 * 1024 * 1024;

    /// Create a provider issuing blocks of at least `block_size` bytes,
    /// rounded up to a whole number of system pages.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero, if the system reports an unusable
    /// page size, or if rounding up overflows `usize`.
    pub fn new(block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be nonzero");
        let page_size = sys::page_size();
        assert!(
            page_size.is_power_of_two(),
            "page size {page_size} is not a power of two"
        );
        let block_size = block_size
            .checked_next_multiple_of(page_size)
            .expect("block size rounds up past usize::MAX");
        Self {
            block_size,
            page_size,
        }
    }

    /// The system page size blocks are rounded and aligned to.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for PageBlocks {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}

// SAFETY: every block is a fresh private mapping of `self.block_size` bytes
// (a whole number of pages, so page-aligned), mapped read/write and owned by
// this process until `release` unmaps it. Both sizes are fixed at
// construction and never change.
unsafe impl BlockProvider for PageBlocks {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_align(&self) -> usize {
        self.page_size
    }

    fn acquire(&mut self, hint: Option<NonNull<u8>>) -> Option<Block> {
        let base = sys::map(hint, self.block_size)?;
        // SAFETY: `base` heads a fresh read/write mapping of
        // `self.block_size` bytes, exclusive until released.
        Some(unsafe { Block::new(base) })
    }

    unsafe fn release(&mut self, block: Block) {
        // SAFETY: the caller contract puts `block` on this provider's
        // `acquire`, so it is a live mapping of exactly `self.block_size`
        // bytes.
        unsafe { sys::unmap(block.base(), self.block_size) }
    }
}

#[cfg(unix)]
mod sys {
    use std::ptr::{self, NonNull};

    pub fn page_size() -> usize {
        // SAFETY: sysconf with a valid name reads system configuration and
        // has no memory effects.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
        if page_size < 1 {
            panic!("unsupported page size {page_size}");
        }
        page_size as usize
    }

    pub fn map(hint: Option<NonNull<u8>>, len: usize) -> Option<NonNull<u8>> {
        let addr = hint.map_or(ptr::null_mut(), |h| h.as_ptr().cast());
        // SAFETY: anonymous private mapping of `len > 0` bytes; the kernel
        // is free to ignore `addr` and place the mapping anywhere.
        let ptr = unsafe {
            libc::mmap(
                addr,
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return None;
        }
        NonNull::new(ptr.cast::<u8>())
    }

    /// # Safety
    ///
    /// `base` must be a live mapping of exactly `len` bytes produced by
    /// [`map`], not yet unmapped.
    pub unsafe fn unmap(base: NonNull<u8>, len: usize) {
        // SAFETY: per this function's contract.
        unsafe {
            libc::munmap(base.as_ptr().cast(), len);
        }
    }
}

#[cfg(windows)]
mod sys {
    use std::mem;
    use std::ptr::{self, NonNull};

    use windows_sys::Win32::System::Memory::{
        VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
    };
    use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

    pub fn page_size() -> usize {
        // SAFETY: SYSTEM_INFO is plain data and GetSystemInfo fills it in.
        let mut system_info: SYSTEM_INFO = unsafe { mem::zeroed() };
        unsafe {
            GetSystemInfo(&mut system_info);
        }
        system_info.dwPageSize as usize
    }

    pub fn map(hint: Option<NonNull<u8>>, len: usize) -> Option<NonNull<u8>> {
        let addr = hint.map_or(ptr::null(), |h| h.as_ptr().cast_const().cast());
        // SAFETY: reserves and commits `len` bytes of fresh pages. A hinted
        // request for an unavailable range yields null, which surfaces as
        // `None`.
        let ptr = unsafe { VirtualAlloc(addr, len, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE) };
        NonNull::new(ptr.cast::<u8>())
    }

    /// # Safety
    ///
    /// `base` must be the base address of a live allocation produced by
    /// [`map`], not yet freed.
    pub unsafe fn unmap(base: NonNull<u8>, _len: usize) {
        // SAFETY: per this function's contract. MEM_RELEASE requires a size
        // of zero; the OS tracks the allocation's extent.
        unsafe {
            VirtualFree(base.as_ptr().cast(), 0, MEM_RELEASE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_block_size_up_to_page_multiple() {
        let pages = PageBlocks::new(1);
        assert_eq!(pages.block_size(), pages.page_size());

        let pages = PageBlocks::new(pages.page_size() + 1);
        assert_eq!(pages.block_size(), 2 * pages.page_size());
    }

    #[test]
    fn exact_multiple_is_not_rounded() {
        let probe = PageBlocks::new(1);
        let pages = PageBlocks::new(4 * probe.page_size());
        assert_eq!(pages.block_size(), 4 * probe.page_size());
    }

    #[test]
    fn default_block_size_is_page_aligned() {
        let pages = PageBlocks::default();
        assert!(pages.block_size() >= PageBlocks::DEFAULT_BLOCK_SIZE);
        assert_eq!(pages.block_size() % pages.page_size(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn blocks_are_page_aligned_and_writable() {
        let mut pages = PageBlocks::new(1);
        let block = pages.acquire(None).expect("mapping failed");
        assert_eq!(block.base().as_ptr() as usize % pages.page_size(), 0);
        // SAFETY: the provider contract makes the whole block writable.
        unsafe {
            block.base().as_ptr().write_bytes(0xCD, pages.block_size());
            assert_eq!(*block.base().as_ptr().add(pages.block_size() - 1), 0xCD);
        }
        // SAFETY: acquired from `pages` above, released exactly once.
        unsafe { pages.release(block) };
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn blocks_release_in_any_order() {
        let mut pages = PageBlocks::new(1);
        let first = pages.acquire(None).expect("mapping failed");
        let second = pages.acquire(None).expect("mapping failed");
        // SAFETY: both blocks were acquired from `pages` above; each is
        // released exactly once.
        unsafe {
            pages.release(first);
            pages.release(second);
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn hinted_acquire_still_produces_a_block() {
        let mut pages = PageBlocks::new(1);
        let block = pages.acquire(None).expect("mapping failed");
        // Hint at the address right after the existing block. The OS may
        // or may not honor it; the call must still produce a usable block.
        // SAFETY: one-past-the-end of a live mapping is a valid address to
        // compute.
        let hint = unsafe { block.base().add(pages.block_size()) };
        let hinted = pages
            .acquire(Some(hint))
            .or_else(|| pages.acquire(None))
            .expect("mapping failed");
        // SAFETY: both blocks were acquired from `pages` above; each is
        // released exactly once.
        unsafe {
            pages.release(hinted);
            pages.release(block);
        }
    }

    #[test]
    #[should_panic(expected = "block size must be nonzero")]
    fn zero_block_size_panics() {
        let _ = PageBlocks::new(0);
    }
}
