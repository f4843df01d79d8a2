use crate::utils::align::WORD;
use crate::utils::word::{read_word, write_word};

/// Bytes reserved at the start of the segment for the allocator state
/// (the word-aligned total segment size)
pub const STATE_HEADER_SIZE: usize = WORD;

/// Bytes of metadata placed in front of every block's payload
///
/// One word holding the size and in-use flag. Debug builds add a second
/// word recording the owning segment.
#[cfg(debug_assertions)]
pub const BLOCK_HEADER_SIZE: usize = 2 * WORD;
/// Bytes of metadata placed in front of every block's payload
#[cfg(not(debug_assertions))]
pub const BLOCK_HEADER_SIZE: usize = WORD;

// Sizes are word multiples, so bit 0 of the size word is free for the flag
const IN_USE_BIT: usize = 1;

/// Decoded block header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Payload capacity in bytes
    pub size: usize,
    /// True while the block is handed out to a caller
    pub in_use: bool,
}

impl BlockHeader {
    pub const fn free(size: usize) -> Self {
        Self {
            size,
            in_use: false,
        }
    }

    pub const fn used(size: usize) -> Self {
        Self { size, in_use: true }
    }

    #[inline]
    pub fn read(segment: &[u8], at: usize) -> Self {
        let raw = read_word(segment, at);
        Self {
            size: raw & !IN_USE_BIT,
            in_use: raw & IN_USE_BIT != 0,
        }
    }

    #[inline]
    pub fn write(self, segment: &mut [u8], at: usize, owner: Owner) {
        debug_assert!(
            self.size & IN_USE_BIT == 0,
            "block size {} is not word aligned",
            self.size
        );
        let raw = if self.in_use {
            self.size | IN_USE_BIT
        } else {
            self.size
        };
        write_word(segment, at, raw);
        owner.write(segment, at);
    }
}

/// Identity of the segment a header was written by
///
/// Zero-sized in release builds; debug builds store the segment base address
/// in the second header word and compare it when a block is freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Owner(#[cfg(debug_assertions)] usize);

impl Owner {
    #[cfg(debug_assertions)]
    pub fn of(segment: &[u8]) -> Self {
        Self(segment.as_ptr() as usize)
    }

    #[cfg(not(debug_assertions))]
    pub fn of(_segment: &[u8]) -> Self {
        Self()
    }

    #[cfg(debug_assertions)]
    pub fn read(segment: &[u8], at: usize) -> Self {
        Self(read_word(segment, at + WORD))
    }

    #[cfg(not(debug_assertions))]
    pub fn read(_segment: &[u8], _at: usize) -> Self {
        Self()
    }

    #[cfg(debug_assertions)]
    fn write(self, segment: &mut [u8], at: usize) {
        write_word(segment, at + WORD, self.0);
    }

    #[cfg(not(debug_assertions))]
    fn write(self, _segment: &mut [u8], _at: usize) {}
}
