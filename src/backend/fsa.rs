use log::{debug, trace};

use crate::utils::align::{WORD, align_up};
use crate::utils::word::{read_word, write_word};
use crate::{Allocator, InitError, SegPtr};

/// Bytes reserved at the start of the segment for the free list head
pub const STATE_HEADER_SIZE: usize = WORD;

/// Marks the end of the free list
const END: usize = 0;

/// Fixed size allocator over a caller-owned segment
///
/// The segment is cut into equal word-aligned blocks after a one-word state
/// header. Free blocks form an intrusive singly linked list: the state word
/// holds the offset of the first free block and each free block's first word
/// holds the offset of the next, with 0 ending the list.
///
/// ```text
///   ┌──────┬─────────┬─────────┬─────────┬─────────┐
///   │ head │ block 0 │ block 1 │ block 2 │ block 3 │
///   └──┬───┴─────────┴────▲────┴──┬──────┴─────────┘
///      └──────────────────┘       │    ▲
///                                 └────┘ ...
/// ```
///
/// # Examples
///
/// ```
/// use segalloc::prelude::*;
///
/// let mut segment = [0u8; 256];
/// let mut fsa = Fsa::init(&mut segment, 24).unwrap();
/// let total = fsa.count_free();
///
/// let block = fsa.alloc().unwrap();
/// assert_eq!(fsa.count_free(), total - 1);
///
/// fsa.free(block);
/// assert_eq!(fsa.count_free(), total);
/// ```
pub struct Fsa<'seg> {
    segment: &'seg mut [u8],
    block_size: usize,
    block_count: usize,
}

impl<'seg> Fsa<'seg> {
    /// Segment length needed for `num_blocks` blocks of `block_size` bytes
    ///
    /// Saturates at `usize::MAX` for geometries that cannot exist.
    ///
    /// ```
    /// use segalloc::prelude::*;
    ///
    /// let size = Fsa::suggest_size(10, 20);
    /// let mut segment = vec![0u8; size];
    /// let fsa = Fsa::init(&mut segment, 20).unwrap();
    /// assert_eq!(fsa.count_free(), 10);
    /// ```
    pub const fn suggest_size(num_blocks: usize, block_size: usize) -> usize {
        match Self::aligned_block(block_size) {
            Some(block) => STATE_HEADER_SIZE.saturating_add(num_blocks.saturating_mul(block)),
            None => usize::MAX,
        }
    }

    /// Cuts `segment` into as many `block_size` blocks as fit, all free
    ///
    /// The block size is rounded up to a word, and to at least one word so a
    /// free block can hold its link.
    ///
    /// # Errors
    ///
    /// [`InitError::BlockDoesNotFit`] if not even one block fits after the
    /// state header.
    pub fn init(segment: &'seg mut [u8], block_size: usize) -> Result<Self, InitError> {
        let block = Self::aligned_block(block_size);
        let required = block.and_then(|block| block.checked_add(STATE_HEADER_SIZE));
        let block_size = match (block, required) {
            (Some(block), Some(required)) if required <= segment.len() => block,
            _ => {
                return Err(InitError::BlockDoesNotFit {
                    size: segment.len(),
                    required: required.unwrap_or(usize::MAX),
                });
            }
        };

        let block_count = (segment.len() - STATE_HEADER_SIZE) / block_size;
        for i in 0..block_count {
            let at = STATE_HEADER_SIZE + i * block_size;
            let next = if i + 1 < block_count {
                at + block_size
            } else {
                END
            };
            write_word(segment, at, next);
        }
        write_word(segment, 0, STATE_HEADER_SIZE);

        debug!(
            "fsa init: {} blocks of {} bytes in a {} byte segment",
            block_count,
            block_size,
            segment.len()
        );
        Ok(Self {
            segment,
            block_size,
            block_count,
        })
    }

    /// Pops the first free block in O(1)
    ///
    /// Returns `None` when every block is in use.
    pub fn alloc(&mut self) -> Option<SegPtr> {
        let head = read_word(self.segment, 0);
        if head == END {
            return None;
        }
        let next = read_word(self.segment, head);
        write_word(self.segment, 0, next);
        trace!("fsa alloc -> {:#x}", head);
        SegPtr::new(head)
    }

    /// Pushes a block back onto the free list in O(1)
    ///
    /// `None` is a no-op. Freeing the same block twice corrupts the list.
    pub fn free<P: Into<Option<SegPtr>>>(&mut self, ptr: P) {
        let Some(ptr) = ptr.into() else {
            return;
        };
        let valid = self.is_block(ptr);
        debug_assert!(valid, "{:#x} is not a block of this segment", ptr.offset());
        if !valid {
            return;
        }
        let head = read_word(self.segment, 0);
        write_word(self.segment, ptr.offset(), head);
        write_word(self.segment, 0, ptr.offset());
        trace!("fsa free({:#x})", ptr.offset());
    }

    /// Number of blocks on the free list, O(n)
    pub fn count_free(&self) -> usize {
        let mut count = 0;
        let mut at = read_word(self.segment, 0);
        // Bounded so a corrupted (cyclic) list still terminates
        while at != END && count < self.block_count {
            count += 1;
            at = read_word(self.segment, at);
        }
        count
    }

    /// Word-aligned size of every block
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks the segment was cut into
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Payload of a block
    ///
    /// Free blocks are not tracked individually, so any block boundary is
    /// accepted. The first word of a free block holds its link.
    pub fn get(&self, ptr: SegPtr) -> Option<&[u8]> {
        let start = ptr.offset();
        self.is_block(ptr)
            .then(|| &self.segment[start..start + self.block_size])
    }

    /// Mutable payload of a block
    pub fn get_mut(&mut self, ptr: SegPtr) -> Option<&mut [u8]> {
        let start = ptr.offset();
        if !self.is_block(ptr) {
            return None;
        }
        Some(&mut self.segment[start..start + self.block_size])
    }

    const fn aligned_block(block_size: usize) -> Option<usize> {
        align_up(if block_size == 0 { 1 } else { block_size })
    }

    fn is_block(&self, ptr: SegPtr) -> bool {
        let offset = ptr.offset();
        offset >= STATE_HEADER_SIZE
            && (offset - STATE_HEADER_SIZE) % self.block_size == 0
            && (offset - STATE_HEADER_SIZE) / self.block_size < self.block_count
    }
}

impl Allocator for Fsa<'_> {
    fn alloc_uninit(&mut self, len: usize) -> Option<(SegPtr, &mut [u8])> {
        if len > self.block_size {
            return None;
        }
        let ptr = self.alloc()?;
        let buf = Fsa::get_mut(self, ptr)?;
        Some((ptr, &mut buf[..len]))
    }

    fn free<P: Into<Option<SegPtr>>>(&mut self, ptr: P) {
        Fsa::free(self, ptr)
    }

    fn get(&self, ptr: SegPtr) -> Option<&[u8]> {
        Fsa::get(self, ptr)
    }

    fn get_mut(&mut self, ptr: SegPtr) -> Option<&mut [u8]> {
        Fsa::get_mut(self, ptr)
    }

    fn largest_free(&self) -> usize {
        if read_word(self.segment, 0) == END {
            0
        } else {
            self.block_size
        }
    }

    fn segment_size(&self) -> usize {
        self.segment.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fsa_init() {
        let mut seg = [0u8; STATE_HEADER_SIZE + 4 * 16];
        let fsa = Fsa::init(&mut seg, 16).unwrap();

        assert_eq!(fsa.block_size(), 16);
        assert_eq!(fsa.block_count(), 4);
        assert_eq!(fsa.count_free(), 4);
    }

    #[test]
    fn test_fsa_block_size_rounded() {
        let mut seg = [0u8; 256];
        let fsa = Fsa::init(&mut seg, 5).unwrap();
        assert_eq!(fsa.block_size(), WORD);

        let mut seg = [0u8; 256];
        let fsa = Fsa::init(&mut seg, 0).unwrap();
        assert_eq!(fsa.block_size(), WORD);
    }

    #[test]
    fn test_fsa_init_too_small() {
        let mut seg = [0u8; STATE_HEADER_SIZE + 15];
        assert_eq!(
            Fsa::init(&mut seg, 16).err(),
            Some(InitError::BlockDoesNotFit {
                size: STATE_HEADER_SIZE + 15,
                required: STATE_HEADER_SIZE + 16,
            })
        );

        let mut seg = [0u8; 64];
        assert!(Fsa::init(&mut seg, usize::MAX).is_err());
    }

    #[test]
    fn test_fsa_exactly_one_block() {
        let mut seg = [0u8; STATE_HEADER_SIZE + 16];
        let mut fsa = Fsa::init(&mut seg, 16).unwrap();

        let ptr = fsa.alloc().unwrap();
        assert_eq!(ptr.offset(), STATE_HEADER_SIZE);
        assert!(fsa.alloc().is_none());
        assert_eq!(fsa.count_free(), 0);
    }

    #[test]
    fn test_fsa_trailing_bytes_unused() {
        let mut seg = [0u8; STATE_HEADER_SIZE + 3 * 16 + 15];
        let fsa = Fsa::init(&mut seg, 16).unwrap();
        assert_eq!(fsa.block_count(), 3);
    }

    #[test]
    fn test_fsa_alloc_in_address_order() {
        let mut seg = [0u8; STATE_HEADER_SIZE + 3 * 16];
        let mut fsa = Fsa::init(&mut seg, 16).unwrap();

        let a = fsa.alloc().unwrap();
        let b = fsa.alloc().unwrap();
        let c = fsa.alloc().unwrap();

        assert_eq!(a.offset(), STATE_HEADER_SIZE);
        assert_eq!(b.offset(), STATE_HEADER_SIZE + 16);
        assert_eq!(c.offset(), STATE_HEADER_SIZE + 32);
        assert!(fsa.alloc().is_none());
    }

    #[test]
    fn test_fsa_free_is_lifo() {
        let mut seg = [0u8; 128];
        let mut fsa = Fsa::init(&mut seg, 16).unwrap();

        let a = fsa.alloc().unwrap();
        let b = fsa.alloc().unwrap();
        fsa.free(a);
        fsa.free(b);

        assert_eq!(fsa.alloc(), Some(b));
        assert_eq!(fsa.alloc(), Some(a));
    }

    #[test]
    fn test_fsa_count_free_tracks_alloc_and_free() {
        let mut seg = [0u8; STATE_HEADER_SIZE + 8 * 8];
        let mut fsa = Fsa::init(&mut seg, 8).unwrap();

        let mut held = Vec::new();
        for expected in (0..8).rev() {
            held.push(fsa.alloc().unwrap());
            assert_eq!(fsa.count_free(), expected);
        }
        for (i, ptr) in held.into_iter().enumerate() {
            fsa.free(ptr);
            assert_eq!(fsa.count_free(), i + 1);
        }
    }

    #[test]
    fn test_fsa_free_none_is_noop() {
        let mut seg = [0u8; 64];
        let mut fsa = Fsa::init(&mut seg, 8).unwrap();
        let before = fsa.count_free();
        fsa.free(None);
        assert_eq!(fsa.count_free(), before);
    }

    #[test]
    fn test_fsa_payload_survives_neighbours() {
        let mut seg = [0u8; 128];
        let mut fsa = Fsa::init(&mut seg, 16).unwrap();

        let a = fsa.alloc().unwrap();
        let b = fsa.alloc().unwrap();
        fsa.get_mut(a).unwrap().fill(0xAA);
        fsa.get_mut(b).unwrap().fill(0xBB);

        fsa.free(b);
        let _ = fsa.alloc().unwrap();
        assert!(fsa.get(a).unwrap().iter().all(|&x| x == 0xAA));
    }

    #[test]
    fn test_fsa_get_rejects_non_boundaries() {
        let mut seg = [0u8; 128];
        let fsa = Fsa::init(&mut seg, 16).unwrap();

        assert!(fsa.get(SegPtr::new(STATE_HEADER_SIZE).unwrap()).is_some());
        assert!(fsa.get(SegPtr::new(STATE_HEADER_SIZE + 8).unwrap()).is_none());
        assert!(fsa.get(SegPtr::new(STATE_HEADER_SIZE + 16 * 7).unwrap()).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not a block of this segment")]
    fn test_fsa_free_foreign_offset_asserts() {
        let mut seg = [0u8; 128];
        let mut fsa = Fsa::init(&mut seg, 16).unwrap();
        fsa.free(SegPtr::new(STATE_HEADER_SIZE + 3));
    }

    #[test]
    fn test_fsa_suggest_size() {
        assert_eq!(Fsa::suggest_size(4, 16), STATE_HEADER_SIZE + 64);
        assert_eq!(Fsa::suggest_size(3, 1), STATE_HEADER_SIZE + 3 * WORD);
        assert_eq!(Fsa::suggest_size(0, 16), STATE_HEADER_SIZE);
        assert_eq!(Fsa::suggest_size(usize::MAX, 16), usize::MAX);

        let mut seg = vec![0u8; Fsa::suggest_size(5, 20)];
        let fsa = Fsa::init(&mut seg, 20).unwrap();
        assert_eq!(fsa.count_free(), 5);
    }

    #[test]
    fn test_fsa_through_allocator_trait() {
        let mut seg = [0u8; 64];
        let mut fsa = Fsa::init(&mut seg, 16).unwrap();

        assert!(fsa.alloc_uninit(17).is_none());
        let ptr = fsa.alloc_from(b"sixteen bytes!!!").unwrap();
        assert_eq!(Allocator::get(&fsa, ptr).unwrap(), b"sixteen bytes!!!");
        assert_eq!(Allocator::largest_free(&fsa), 16);

        while fsa.alloc().is_some() {}
        assert_eq!(Allocator::largest_free(&fsa), 0);
    }
}
