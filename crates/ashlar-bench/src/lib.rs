//! Benchmark profiles and utilities for the ashlar arena allocator.
//!
//! Provides pre-built arenas and deterministic request schedules so the
//! individual benchmarks measure allocation, not setup:
//!
//! - [`scratch_arena`]: heap-backed arena at a given block size
//! - [`page_arena`]: OS-page-backed arena with single-page blocks
//! - [`request_sizes`]: seeded mixed-size allocation schedule

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ashlar::{Arena, HeapArena, PageArena, PageBlocks};

/// Build a heap-backed arena with `block_size`-byte blocks.
///
/// Panics on provider failure; benchmark setup has no error path worth
/// measuring.
pub fn scratch_arena(block_size: usize) -> HeapArena {
    HeapArena::with_block_size(block_size).expect("heap provider failed during bench setup")
}

/// Build an OS-page-backed arena with single-page blocks.
///
/// Single pages keep the chain growing quickly, so block-advance costs
/// show up in the numbers instead of hiding inside one huge block.
pub fn page_arena() -> PageArena {
    Arena::with_provider(PageBlocks::new(1)).expect("page provider failed during bench setup")
}

/// Generate `n` deterministic request sizes in `1..=max`.
///
/// A fixed-seed LCG keeps runs comparable across machines and commits
/// without pulling a randomness crate into the benchmarks.
pub fn request_sizes(n: usize, max: usize, seed: u64) -> Vec<usize> {
    assert!(max > 0, "max request size must be nonzero");
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as usize % max) + 1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashlar::HeapBlocks;

    #[test]
    fn scratch_arena_reports_requested_block_size() {
        let arena = scratch_arena(4096);
        assert_eq!(arena.block_size(), 4096);
    }

    #[test]
    fn request_sizes_stay_in_bounds() {
        let sizes = request_sizes(1000, 64, 42);
        assert_eq!(sizes.len(), 1000);
        assert!(sizes.iter().all(|&s| (1..=64).contains(&s)));
    }

    #[test]
    fn request_sizes_are_deterministic() {
        let a = request_sizes(100, 512, 7);
        let b = request_sizes(100, 512, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_alignment_profile_builds() {
        let arena = Arena::with_provider(HeapBlocks::with_align(1024, 64))
            .expect("heap provider failed");
        assert_eq!(arena.block_align(), 64);
    }
}
