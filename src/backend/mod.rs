//! Allocator backend implementations
//!
//! Both backends carve a caller-owned segment and keep all of their
//! bookkeeping inside it.

/// Variable size allocator with lazy coalescing
#[cfg(feature = "vsa")]
pub mod vsa;

/// Fixed size allocator with an intrusive free list
#[cfg(feature = "fsa")]
pub mod fsa;
