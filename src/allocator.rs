//! # SegAlloc - Segment Allocators for no_std
//!
//! SegAlloc manages a byte segment supplied by the caller. It never asks for
//! more memory and never gives any back: it only carves the segment it was
//! handed.
//!
//! - **Variable size allocator** ([`Vsa`](prelude::Vsa)) - first-fit over an implicit block
//!   chain with lazy coalescing of adjacent free blocks
//! - **Fixed size allocator** ([`Fsa`](prelude::Fsa)) - O(1) intrusive free list over
//!   uniform blocks
//! - **Offsets, not pointers** - allocations are [`SegPtr`] byte offsets
//!   into the segment, so the whole crate is safe Rust
//!
//! ## Quick Start
//!
//! ```rust
//! use segalloc::prelude::*;
//!
//! let mut segment = [0u8; 256];
//! let mut vsa = Vsa::init(&mut segment).unwrap();
//!
//! let a = vsa.alloc(40).unwrap();
//! let b = vsa.alloc(40).unwrap();
//! vsa.get_mut(a).unwrap()[..5].copy_from_slice(b"hello");
//!
//! vsa.free(a);
//! vsa.free(b);
//!
//! // Both blocks are one contiguous run again
//! assert!(vsa.alloc(90).is_some());
//! ```
//!
//! ## Segment Layout (VSA)
//!
//! ```text
//!   ┌────────────┬────────┬───────────┬────────┬───────────┬────────┬─────────┐
//!   │ total_size │ hdr +N │ payload N │ hdr -M │ payload M │ hdr +K │ payload │
//!   └────────────┴────────┴───────────┴────────┴───────────┴────────┴─────────┘
//!    state header  in use               free                  in use
//! ```
//!
//! Headers form a gapless chain: the byte after one payload is the next
//! header. Freeing only flips a header to free; runs of free blocks are
//! merged the next time an allocation scans across them.
//!
//! ## Features
//!
//! - `vsa` (default) - Variable size allocator
//! - `fsa` (default) - Fixed size allocator
//!
//! ## Concurrency
//!
//! Nothing here locks. An allocator borrows its segment mutably, so sharing
//! one across threads requires the caller to wrap it in a mutex.
//!
//! ## Logging
//!
//! Initialization is reported at `debug` and every successful allocation or
//! free at `trace` through the [`log`] facade. Allocation failures are
//! returned, not logged.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

use core::num::NonZeroUsize;

// Internal modules - use prelude for public API
mod backend;
mod utils;

/// Convenient re-exports for common use
///
/// ```
/// use segalloc::prelude::*;
/// ```
pub mod prelude;

/// Offset of an allocated payload from the start of its segment
///
/// Offset 0 always holds allocator state, so a `SegPtr` is never zero and
/// `Option<SegPtr>` is the same size as `usize`. `None` plays the role of a
/// null pointer.
///
/// # Examples
///
/// ```
/// use segalloc::SegPtr;
///
/// assert!(SegPtr::new(0).is_none());
/// assert_eq!(SegPtr::new(24).unwrap().offset(), 24);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegPtr(NonZeroUsize);

impl SegPtr {
    /// Wraps a byte offset, returning `None` for 0
    pub const fn new(offset: usize) -> Option<Self> {
        match NonZeroUsize::new(offset) {
            Some(offset) => Some(Self(offset)),
            None => None,
        }
    }

    /// Byte offset from the start of the segment
    pub const fn offset(self) -> usize {
        self.0.get()
    }
}

/// Reasons a segment cannot be turned into an allocator
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// The segment cannot hold the state header and one block header
    #[error("segment of {size} bytes is smaller than the {required} bytes of allocator metadata")]
    SegmentTooSmall {
        /// Length of the segment that was offered
        size: usize,
        /// Minimum length accepted
        required: usize,
    },
    /// The segment cannot hold the state header and a single fixed block
    #[error("segment of {size} bytes cannot hold one block, {required} bytes needed")]
    BlockDoesNotFit {
        /// Length of the segment that was offered
        size: usize,
        /// Minimum length accepted
        required: usize,
    },
}

/// Common contract of the segment allocators
///
/// Collaborators that want segment-backed storage code against this trait and
/// never touch segment internals.
///
/// # Examples
///
/// ```
/// use segalloc::prelude::*;
///
/// fn stash<A: Allocator>(alloc: &mut A, data: &[u8]) -> Option<SegPtr> {
///     alloc.alloc_from(data)
/// }
///
/// let mut segment = [0u8; 128];
/// let mut vsa = Vsa::init(&mut segment).unwrap();
/// let ptr = stash(&mut vsa, b"abc").unwrap();
/// assert_eq!(&vsa.get(ptr).unwrap()[..3], b"abc");
/// ```
pub trait Allocator {
    /// Allocates at least `len` bytes
    ///
    /// Returns the block and a slice of exactly `len` bytes at its start.
    /// Contents are whatever the segment held before.
    ///
    /// # Returns
    ///
    /// - `Some((ptr, buffer))` if allocation succeeds
    /// - `None` if no free space can hold `len` bytes
    fn alloc_uninit(&mut self, len: usize) -> Option<(SegPtr, &mut [u8])>;

    /// Returns a block to the allocator
    ///
    /// Passing `None` is a no-op. Freeing a block twice, or a `SegPtr` from a
    /// different segment, breaks the allocator's bookkeeping; debug builds
    /// assert on what they can detect.
    fn free<P: Into<Option<SegPtr>>>(&mut self, ptr: P);

    /// Payload of a live block
    ///
    /// The slice spans the whole block capacity, which may exceed the size
    /// that was requested.
    fn get(&self, ptr: SegPtr) -> Option<&[u8]>;

    /// Mutable payload of a live block
    fn get_mut(&mut self, ptr: SegPtr) -> Option<&mut [u8]>;

    /// Largest request that would currently succeed
    fn largest_free(&self) -> usize;

    /// Bytes of the segment under management
    fn segment_size(&self) -> usize;

    /// Allocates a block and copies `data` into it
    fn alloc_from(&mut self, data: &[u8]) -> Option<SegPtr> {
        let (ptr, buf) = self.alloc_uninit(data.len())?;
        buf.copy_from_slice(data);
        Some(ptr)
    }
}
