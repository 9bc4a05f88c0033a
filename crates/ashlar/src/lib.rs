//! Bump-pointer arena allocation over pluggable block providers.
//!
//! An [`Arena`] serves many small, short-lived allocations from big blocks
//! of memory acquired in bulk: each request advances a cursor, a full block
//! links in the next one, and [`Arena::reset`] hands the whole chain back
//! for the next cycle in two stores. Where memory comes from is a policy
//! the arena is generic over, so the same allocation logic runs on heap
//! blocks in tests and on OS pages in production.
//!
//! # Architecture
//!
//! ```text
//! Arena<P: BlockProvider> (bump cursor over an owned block chain)
//! ├── blocks: Block[]     (equal-size, acquired once, reused after reset)
//! ├── head / cursor       (current block index + byte offset within it)
//! └── P                   (block acquisition policy, from ashlar-blocks)
//!     ├── HeapBlocks      (global allocator; portable default)
//!     └── PageBlocks      (OS virtual memory; page-aligned 2 MiB blocks)
//! ```
//!
//! # Lifecycle
//!
//! Memory flows one way. Blocks move from the provider into the chain as
//! the high-water mark grows, stay there across any number of
//! [`Arena::reset`] calls, and return to the provider only when the arena
//! is dropped. Individual allocations are never freed; the unit of reuse
//! is the whole cycle.
//!
//! # Safety model
//!
//! This crate contains bounded `unsafe`: pointer arithmetic inside blocks
//! the provider has vouched for, the in-place write in [`Arena::store`],
//! and the handback of owned blocks to the provider on drop. Every
//! `unsafe` block carries a `// SAFETY:` comment.
//! Returned pointers are raw by design. The arena does not know when a
//! caller stops using them, so the validity window (until reset or drop)
//! is documented contract, not a lifetime the compiler checks. The checked
//! methods validate request sizes and alignments; the `*_unchecked` tier
//! trusts the caller and is `unsafe` accordingly.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod arena;
pub mod error;

// Public re-exports for the primary API surface.
pub use arena::{Arena, HeapArena, PageArena};
pub use error::ArenaError;

// The provider vocabulary, so downstream code needs only this crate.
pub use ashlar_blocks::{Block, BlockProvider, HeapBlocks, PageBlocks};
