use log::{debug, trace};

use crate::utils::align::{WORD, align_down, align_up, is_aligned};
use crate::utils::word::{read_word, write_word};
use crate::{Allocator, InitError, SegPtr};

mod header;
mod scan;

use header::{BlockHeader, Owner};
pub use header::{BLOCK_HEADER_SIZE, STATE_HEADER_SIZE};

/// Offset of the first payload byte in any segment
const FIRST_PAYLOAD: usize = STATE_HEADER_SIZE + BLOCK_HEADER_SIZE;

/// Smallest leftover worth describing with its own free header: the header
/// plus one word of payload. Anything less stays inside the allocated block.
const MIN_SPLIT: usize = BLOCK_HEADER_SIZE + WORD;

/// Variable size allocator over a caller-owned segment
///
/// All bookkeeping lives inside the segment: a state header holding the
/// word-aligned segment size, then a gapless chain of blocks, each a header
/// followed by its payload. Freed blocks are only flagged; runs of adjacent
/// free blocks are merged when a later allocation scans across them.
///
/// # Examples
///
/// ```
/// use segalloc::prelude::*;
///
/// let mut segment = [0u8; 256];
/// let mut vsa = Vsa::init(&mut segment).unwrap();
/// let initial = vsa.largest_free();
/// assert_eq!(initial, 256 - STATE_HEADER_SIZE - BLOCK_HEADER_SIZE);
///
/// let ptr = vsa.alloc(40).unwrap();
/// assert_eq!(ptr.offset() % WORD, 0);
/// assert_eq!(vsa.largest_free(), initial - 40 - BLOCK_HEADER_SIZE);
///
/// vsa.free(ptr);
/// assert_eq!(vsa.largest_free(), initial);
/// ```
pub struct Vsa<'seg> {
    segment: &'seg mut [u8],
}

/// A block as seen by [`Vsa::blocks`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Payload offset
    pub ptr: SegPtr,
    /// Payload capacity in bytes
    pub size: usize,
    /// False for free blocks
    pub in_use: bool,
}

impl<'seg> Vsa<'seg> {
    /// Takes over `segment` as a single free block
    ///
    /// The managed size is the segment length rounded down to a word. Payload
    /// bytes are left as they are.
    ///
    /// # Errors
    ///
    /// [`InitError::SegmentTooSmall`] if the segment cannot hold the state
    /// header and one block header.
    pub fn init(segment: &'seg mut [u8]) -> Result<Self, InitError> {
        if segment.len() < FIRST_PAYLOAD {
            return Err(InitError::SegmentTooSmall {
                size: segment.len(),
                required: FIRST_PAYLOAD,
            });
        }

        let total_size = align_down(segment.len());
        write_word(segment, 0, total_size);

        let mut vsa = Self { segment };
        vsa.write_header(STATE_HEADER_SIZE, BlockHeader::free(total_size - FIRST_PAYLOAD));

        debug!(
            "vsa init: {} bytes managed, {} bytes free, header {} bytes",
            total_size,
            total_size - FIRST_PAYLOAD,
            BLOCK_HEADER_SIZE
        );
        Ok(vsa)
    }

    /// Allocates a block of at least `size` bytes (first fit)
    ///
    /// The size is rounded up to a word; a zero-byte request is served as one
    /// word. Scans left to right, treating adjacent free blocks as one run, and
    /// takes the first run that is large enough. The run is split when the
    /// leftover can hold a header and at least one word; otherwise the
    /// leftover is folded into the returned block.
    ///
    /// Returns `None` when no run is large enough.
    pub fn alloc(&mut self, size: usize) -> Option<SegPtr> {
        let wanted = align_up(size.max(1))?;
        let run = scan::first_fit(self.segment, self.total_size(), wanted)?;
        let leftover = run.capacity - wanted;

        if leftover >= MIN_SPLIT {
            self.write_header(run.start, BlockHeader::used(wanted));
            let tail = run.start + BLOCK_HEADER_SIZE + wanted;
            self.write_header(tail, BlockHeader::free(leftover - BLOCK_HEADER_SIZE));
            trace!(
                "vsa alloc({}) -> {:#x}, {} bytes split off at {:#x}",
                size,
                run.start + BLOCK_HEADER_SIZE,
                leftover - BLOCK_HEADER_SIZE,
                tail
            );
        } else {
            self.write_header(run.start, BlockHeader::used(run.capacity));
            trace!(
                "vsa alloc({}) -> {:#x}, {} bytes folded in",
                size,
                run.start + BLOCK_HEADER_SIZE,
                leftover
            );
        }

        SegPtr::new(run.start + BLOCK_HEADER_SIZE)
    }

    /// Marks a block free in O(1)
    ///
    /// `None` is a no-op, as is freeing a block that is already free. Nothing
    /// is merged here; the next scan does that.
    pub fn free<P: Into<Option<SegPtr>>>(&mut self, ptr: P) {
        let Some(ptr) = ptr.into() else {
            return;
        };
        let at = self.header_of(ptr);
        debug_assert!(at.is_some(), "{:#x} is not a block of this segment", ptr.offset());
        let Some(at) = at else {
            return;
        };
        debug_assert_eq!(
            Owner::read(self.segment, at),
            self.owner(),
            "block at {:#x} belongs to another segment",
            ptr.offset()
        );

        let header = BlockHeader::read(self.segment, at);
        if header.in_use {
            self.write_header(at, BlockHeader::free(header.size));
            trace!("vsa free({:#x}), {} bytes", ptr.offset(), header.size);
        }
    }

    /// Capacity of the largest run of adjacent free blocks
    ///
    /// An allocation of up to this many bytes succeeds.
    pub fn largest_free(&self) -> usize {
        scan::largest_run(self.segment, self.total_size())
    }

    /// Payload of a live block
    pub fn get(&self, ptr: SegPtr) -> Option<&[u8]> {
        let size = self.capacity_of(ptr)?;
        let start = ptr.offset();
        Some(&self.segment[start..start + size])
    }

    /// Mutable payload of a live block
    pub fn get_mut(&mut self, ptr: SegPtr) -> Option<&mut [u8]> {
        let size = self.capacity_of(ptr)?;
        let start = ptr.offset();
        Some(&mut self.segment[start..start + size])
    }

    /// Payload capacity of a live block
    ///
    /// May exceed the requested size when a leftover was folded in.
    pub fn capacity_of(&self, ptr: SegPtr) -> Option<usize> {
        let at = self.header_of(ptr)?;
        let header = BlockHeader::read(self.segment, at);
        let fits = ptr.offset().checked_add(header.size)? <= self.total_size();
        (header.in_use && fits).then_some(header.size)
    }

    /// Walks the block chain from the start of the segment
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        scan::Chain::new(self.segment, self.total_size()).filter_map(|(at, header)| {
            Some(BlockInfo {
                ptr: SegPtr::new(at + BLOCK_HEADER_SIZE)?,
                size: header.size,
                in_use: header.in_use,
            })
        })
    }

    /// Word-aligned segment size recorded at init
    pub fn segment_size(&self) -> usize {
        self.total_size()
    }

    fn total_size(&self) -> usize {
        read_word(self.segment, 0)
    }

    fn owner(&self) -> Owner {
        Owner::of(self.segment)
    }

    fn write_header(&mut self, at: usize, header: BlockHeader) {
        let owner = self.owner();
        header.write(self.segment, at, owner);
    }

    /// Header offset for a payload offset, if it could be a block here
    fn header_of(&self, ptr: SegPtr) -> Option<usize> {
        let offset = ptr.offset();
        (offset >= FIRST_PAYLOAD && offset <= self.total_size() && is_aligned(offset))
            .then(|| offset - BLOCK_HEADER_SIZE)
    }
}

impl Allocator for Vsa<'_> {
    fn alloc_uninit(&mut self, len: usize) -> Option<(SegPtr, &mut [u8])> {
        let ptr = self.alloc(len)?;
        let buf = Vsa::get_mut(self, ptr)?;
        Some((ptr, &mut buf[..len]))
    }

    fn free<P: Into<Option<SegPtr>>>(&mut self, ptr: P) {
        Vsa::free(self, ptr)
    }

    fn get(&self, ptr: SegPtr) -> Option<&[u8]> {
        Vsa::get(self, ptr)
    }

    fn get_mut(&mut self, ptr: SegPtr) -> Option<&mut [u8]> {
        Vsa::get_mut(self, ptr)
    }

    fn largest_free(&self) -> usize {
        Vsa::largest_free(self)
    }

    fn segment_size(&self) -> usize {
        Vsa::segment_size(self)
    }
}
