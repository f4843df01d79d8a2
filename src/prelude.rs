//! Prelude module for convenient imports
//!
//! This is the public API for SegAlloc:
//! ```
//! use segalloc::prelude::*;
//! ```

pub use crate::Allocator;
pub use crate::InitError;
pub use crate::SegPtr;

pub use crate::utils::align::{WORD, align_down, align_up, is_aligned};

#[cfg(feature = "vsa")]
pub use crate::backend::vsa::{BLOCK_HEADER_SIZE, BlockInfo, STATE_HEADER_SIZE, Vsa};

#[cfg(feature = "fsa")]
pub use crate::backend::fsa::Fsa;

