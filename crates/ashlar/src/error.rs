//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
///
/// The two variants are deliberately distinct failure classes. Exhaustion
/// is about the backing source and can succeed on retry against a roomier
/// provider or after freeing memory elsewhere; an oversized request can
/// never succeed on the same arena, no matter how often it is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The block provider could not supply another block, even after
    /// retrying without a placement hint.
    ProviderExhausted {
        /// Size in bytes of the block that could not be acquired.
        block_size: usize,
        /// Number of blocks the arena already held when acquisition failed.
        blocks_held: usize,
    },
    /// A single request larger than any block can hold. The arena is left
    /// exactly as it was.
    OversizedRequest {
        /// Number of bytes requested.
        requested: usize,
        /// Largest request this arena can ever satisfy.
        max: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderExhausted {
                block_size,
                blocks_held,
            } => {
                write!(
                    f,
                    "block provider exhausted: could not acquire a {block_size} byte block ({blocks_held} blocks already held)"
                )
            }
            Self::OversizedRequest { requested, max } => {
                write!(
                    f,
                    "oversized request: {requested} bytes exceeds the per-block maximum of {max} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_exhaustion_context() {
        let err = ArenaError::ProviderExhausted {
            block_size: 4096,
            blocks_held: 7,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("4096"), "got {rendered}");
        assert!(rendered.contains("7 blocks"), "got {rendered}");
    }

    #[test]
    fn display_includes_oversize_bounds() {
        let err = ArenaError::OversizedRequest {
            requested: 2000,
            max: 1024,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("2000"), "got {rendered}");
        assert!(rendered.contains("1024"), "got {rendered}");
    }
}
