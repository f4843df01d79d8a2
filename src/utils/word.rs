//! Native-endian word access at byte offsets inside a segment

use super::align::WORD;

/// Reads the word stored at `at`
///
/// Panics if `at + WORD` is past the end of `segment`.
#[inline]
pub fn read_word(segment: &[u8], at: usize) -> usize {
    let mut raw = [0u8; WORD];
    raw.copy_from_slice(&segment[at..at + WORD]);
    usize::from_ne_bytes(raw)
}

/// Writes `value` as a word at `at`
///
/// Panics if `at + WORD` is past the end of `segment`.
#[inline]
pub fn write_word(segment: &mut [u8], at: usize, value: usize) {
    segment[at..at + WORD].copy_from_slice(&value.to_ne_bytes());
}
