//! Helpers shared by the allocator backends
//!
//! Provides word alignment arithmetic and word access at segment offsets.

pub mod align;
pub mod word;
