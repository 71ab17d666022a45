//! The materialized, ordered part sequence.
//!
//! Seeking needs the total size of the logical stream and the ability to
//! restart from any part, so the parts are collected into a [`PartList`]
//! once, up front. Callers enumerating volumes lazily pay for this with one
//! entry per part held in memory.

use crate::part::FilePart;
use crate::{Error, Result};

/// Position of a [`SegmentedStream`](crate::SegmentedStream) within its
/// part list.
///
/// Cursors are plain values: moving to another part builds a new cursor
/// instead of advancing a shared iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartCursor {
    index: usize,
    start_offset: u64,
}

impl PartCursor {
    /// Index of the part (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Logical offset at which the part's payload begins.
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }
}

/// An ordered, non-empty list of parts with precomputed offsets.
pub struct PartList<P> {
    parts: Vec<P>,
    /// Starting logical offset of each part.
    offsets: Vec<u64>,
    total_size: u64,
}

impl<P: FilePart> PartList<P> {
    /// Collects `parts` and computes the logical total.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPartSequence`] if `parts` yields nothing, or
    /// [`Error::SizeOverflow`] if the declared sizes do not fit in a `u64`.
    pub fn new(parts: impl IntoIterator<Item = P>) -> Result<Self> {
        let parts: Vec<P> = parts.into_iter().collect();
        if parts.is_empty() {
            return Err(Error::EmptyPartSequence);
        }

        let mut offsets = Vec::with_capacity(parts.len());
        let mut total_size = 0u64;
        for part in &parts {
            offsets.push(total_size);
            let compressed_size = part.header().compressed_size;
            total_size = total_size
                .checked_add(compressed_size)
                .ok_or_else(|| Error::SizeOverflow {
                    part: part.display_name().to_string(),
                    compressed_size,
                })?;
        }

        Ok(Self {
            parts,
            offsets,
            total_size,
        })
    }

    /// Returns the number of parts. Never zero.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always `false`; a part list cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns the part at `index`.
    pub fn get(&self, index: usize) -> Option<&P> {
        self.parts.get(index)
    }

    /// Returns the part a cursor points at.
    ///
    /// # Panics
    ///
    /// Panics if `cursor` was built by a different, shorter list.
    pub fn part(&self, cursor: &PartCursor) -> &P {
        &self.parts[cursor.index]
    }

    /// Iterates over the parts in order.
    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.parts.iter()
    }

    /// Sum of all parts' compressed sizes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Logical offset at which part `index` begins.
    pub fn start_offset(&self, index: usize) -> Option<u64> {
        self.offsets.get(index).copied()
    }

    /// Finds the part containing logical `offset`.
    ///
    /// Accumulates compressed sizes from the first part until the running
    /// total reaches `offset`. An offset exactly on a boundary therefore
    /// resolves to the end of the earlier part. Offsets past the total
    /// resolve to the last part.
    pub fn locate(&self, offset: u64) -> usize {
        let last = self.parts.len() - 1;
        if offset > self.total_size {
            return last;
        }

        let mut running = 0u64;
        for (index, part) in self.parts.iter().enumerate() {
            running += part.header().compressed_size;
            if running >= offset {
                return index;
            }
        }
        last
    }

    /// Builds a cursor for part `index`, clamped to the last part.
    pub fn cursor_at(&self, index: usize) -> PartCursor {
        let index = index.min(self.parts.len() - 1);
        PartCursor {
            index,
            start_offset: self.offsets[index],
        }
    }

    /// Builds the cursor following `cursor`, or `None` at the last part.
    pub fn next_cursor(&self, cursor: &PartCursor) -> Option<PartCursor> {
        let index = cursor.index + 1;
        self.offsets.get(index).map(|&start_offset| PartCursor {
            index,
            start_offset,
        })
    }

    /// Consumes the list, returning the parts.
    pub fn into_inner(self) -> Vec<P> {
        self.parts
    }
}

impl<P> std::fmt::Debug for PartList<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartList")
            .field("part_count", &self.parts.len())
            .field("offsets", &self.offsets)
            .field("total_size", &self.total_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{MemoryPart, PartHeader};

    fn list(sizes: &[usize]) -> PartList<MemoryPart> {
        PartList::new(sizes.iter().enumerate().map(|(i, &size)| {
            MemoryPart::from_payload(format!("test.part{}.rar", i + 1), "entry", vec![0u8; size])
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let result = PartList::<MemoryPart>::new(Vec::new());
        assert!(matches!(result, Err(Error::EmptyPartSequence)));
    }

    #[test]
    fn test_size_overflow_rejected() {
        let first = MemoryPart::new(
            "huge.part1.rar",
            PartHeader::new("huge.bin", u64::MAX).split_after(true),
            vec![0u8; 4],
        );
        let second = MemoryPart::new("huge.part2.rar", PartHeader::new("huge.bin", 2), vec![0u8; 2]);

        match PartList::new(vec![first, second]) {
            Err(Error::SizeOverflow {
                part,
                compressed_size,
            }) => {
                assert_eq!(part, "huge.part2.rar");
                assert_eq!(compressed_size, 2);
            }
            other => panic!("Expected SizeOverflow, got: {:?}", other),
        }
    }

    #[test]
    fn test_offsets_and_total() {
        let parts = list(&[10, 15, 7]);
        assert_eq!(parts.len(), 3);
        assert!(!parts.is_empty());
        assert_eq!(parts.total_size(), 32);
        assert_eq!(parts.start_offset(0), Some(0));
        assert_eq!(parts.start_offset(1), Some(10));
        assert_eq!(parts.start_offset(2), Some(25));
        assert_eq!(parts.start_offset(3), None);
    }

    #[test]
    fn test_locate() {
        let parts = list(&[10, 15, 7]);

        assert_eq!(parts.locate(0), 0);
        assert_eq!(parts.locate(5), 0);
        // Boundary offsets resolve to the end of the earlier part
        assert_eq!(parts.locate(10), 0);
        assert_eq!(parts.locate(11), 1);
        assert_eq!(parts.locate(25), 1);
        assert_eq!(parts.locate(26), 2);
        assert_eq!(parts.locate(32), 2);
        // Past the end clamps to the last part
        assert_eq!(parts.locate(1_000), 2);
    }

    #[test]
    fn test_locate_with_empty_parts() {
        let parts = list(&[0, 0, 5]);
        assert_eq!(parts.locate(0), 0);
        assert_eq!(parts.locate(1), 2);
        assert_eq!(parts.locate(5), 2);
    }

    #[test]
    fn test_cursors() {
        let parts = list(&[10, 15, 7]);

        let first = parts.cursor_at(0);
        assert_eq!(first.index(), 0);
        assert_eq!(first.start_offset(), 0);

        let second = parts.next_cursor(&first).unwrap();
        assert_eq!(second.index(), 1);
        assert_eq!(second.start_offset(), 10);
        assert_eq!(parts.part(&second).display_name(), "test.part2.rar");

        let third = parts.next_cursor(&second).unwrap();
        assert_eq!(third.start_offset(), 25);
        assert!(parts.next_cursor(&third).is_none());

        assert_eq!(parts.cursor_at(99).index(), 2);
        assert_eq!(parts.cursor_at(99), third);
    }
}
