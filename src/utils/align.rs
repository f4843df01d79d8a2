//! Word alignment helpers
//!
//! Every size stored in a segment is a multiple of [`WORD`], so headers that
//! follow a payload always start on a word boundary.

/// Native machine word in bytes
pub const WORD: usize = core::mem::size_of::<usize>();

/// Rounds `value` up to the next multiple of [`WORD`]
///
/// Returns `None` if the rounded value does not fit in a `usize`.
///
/// # Examples
///
/// ```
/// use segalloc::prelude::*;
///
/// assert_eq!(align_up(0), Some(0));
/// assert_eq!(align_up(1), Some(WORD));
/// assert_eq!(align_up(WORD), Some(WORD));
/// assert_eq!(align_up(usize::MAX), None);
/// ```
#[inline]
pub const fn align_up(value: usize) -> Option<usize> {
    match value.checked_add(WORD - 1) {
        Some(v) => Some(v & !(WORD - 1)),
        None => None,
    }
}

/// Rounds `value` down to a multiple of [`WORD`]
#[inline]
pub const fn align_down(value: usize) -> usize {
    value & !(WORD - 1)
}

/// True if `value` is a multiple of [`WORD`]
#[inline]
pub const fn is_aligned(value: usize) -> bool {
    value & (WORD - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        let mut alignments = Vec::new();

        for i in 0..10 {
            let sizes = (WORD * i + 1)..=(WORD * (i + 1));
            alignments.push((sizes, WORD * (i + 1)));
        }

        for (sizes, expected) in alignments {
            for size in sizes {
                assert_eq!(align_up(size), Some(expected));
            }
        }
    }

    #[test]
    fn test_align_up_overflow() {
        assert_eq!(align_up(usize::MAX - WORD + 2), None);
        assert_eq!(align_up(usize::MAX - WORD + 1), Some(usize::MAX - WORD + 1));
    }

    #[test]
    fn test_align_down() {
        assert_eq!(align_down(0), 0);
        assert_eq!(align_down(WORD - 1), 0);
        assert_eq!(align_down(WORD + 1), WORD);
        assert_eq!(align_down(256 + WORD - 1), 256);
    }

    #[test]
    fn test_is_aligned() {
        assert!(is_aligned(0));
        assert!(is_aligned(WORD * 3));
        assert!(!is_aligned(WORD + 1));
    }
}
