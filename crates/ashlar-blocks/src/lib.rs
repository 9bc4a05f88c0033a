//! Block acquisition strategies for the ashlar bump arena.
//!
//! Everything an arena knows about memory comes through the
//! [`BlockProvider`] trait: acquire a fixed-size [`Block`], optionally near
//! a hinted address, and release it again at teardown. The arena never
//! touches an allocator directly, so swapping the backing source is a type
//! parameter, not a rewrite.
//!
//! # Architecture
//!
//! ```text
//! BlockProvider (capability: acquire / release fixed-size blocks)
//! ├── HeapBlocks (global allocator; portable default, hint ignored)
//! └── PageBlocks (OS virtual memory; page-aligned, hint = desired base)
//! ```
//!
//! # Safety posture
//!
//! The provider contract is two-sided. Implementing [`BlockProvider`] is
//! `unsafe`: the trait docs spell out what every issued [`Block`] must
//! guarantee. Releasing is `unsafe` to call: backends deallocate through
//! the handle, so the caller vouches that a released block came from the
//! same provider's `acquire` and goes back exactly once. [`Block::new`]
//! carries the matching provenance contract on the way in. Every `unsafe`
//! block carries a `// SAFETY:` comment.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod block;
pub mod heap;
pub mod pages;
pub mod provider;

// Public re-exports for the primary API surface.
pub use block::Block;
pub use heap::HeapBlocks;
pub use pages::PageBlocks;
pub use provider::BlockProvider;
