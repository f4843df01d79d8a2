//! Header chain walking and free-run accounting
//!
//! Adjacent free blocks are never merged when freed. A scan treats a
//! sequence of them as one run whose capacity is the sum of the payloads plus
//! one header per internal boundary, since allocating across the run
//! reclaims those headers.

use super::header::{BLOCK_HEADER_SIZE, BlockHeader, STATE_HEADER_SIZE};

/// Iterator over `(header offset, header)` pairs from the first block to
/// the end of the segment
pub(super) struct Chain<'a> {
    segment: &'a [u8],
    at: usize,
    end: usize,
}

impl<'a> Chain<'a> {
    pub(super) fn new(segment: &'a [u8], end: usize) -> Self {
        Self {
            segment,
            at: STATE_HEADER_SIZE,
            end,
        }
    }
}

impl Iterator for Chain<'_> {
    type Item = (usize, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        if self.at.saturating_add(BLOCK_HEADER_SIZE) > self.end {
            return None;
        }
        let at = self.at;
        let header = BlockHeader::read(self.segment, at);
        self.at = at
            .saturating_add(BLOCK_HEADER_SIZE)
            .saturating_add(header.size);
        Some((at, header))
    }
}

/// A sequence of adjacent free blocks, viewed as if it were merged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Run {
    /// Header offset of the first free block in the run
    pub start: usize,
    /// Payload bytes available if the run became a single block
    pub capacity: usize,
}

#[derive(Default)]
struct RunTracker {
    current: Option<Run>,
}

impl RunTracker {
    fn visit(&mut self, at: usize, header: BlockHeader) -> Option<Run> {
        if header.in_use {
            self.current = None;
            return None;
        }
        let run = match self.current {
            None => Run {
                start: at,
                capacity: header.size,
            },
            Some(run) => Run {
                start: run.start,
                capacity: run.capacity + BLOCK_HEADER_SIZE + header.size,
            },
        };
        self.current = Some(run);
        Some(run)
    }
}

/// First run (left to right) whose capacity reaches `wanted`
///
/// The returned run covers only as many blocks as were needed; the scan stops
/// at the first block that satisfies the request.
pub(super) fn first_fit(segment: &[u8], end: usize, wanted: usize) -> Option<Run> {
    let mut tracker = RunTracker::default();
    Chain::new(segment, end)
        .filter_map(|(at, header)| tracker.visit(at, header))
        .find(|run| run.capacity >= wanted)
}

/// Capacity of the largest run anywhere in the segment
pub(super) fn largest_run(segment: &[u8], end: usize) -> usize {
    let mut tracker = RunTracker::default();
    Chain::new(segment, end)
        .filter_map(|(at, header)| tracker.visit(at, header))
        .map(|run| run.capacity)
        .max()
        .unwrap_or(0)
}
