//! The segmented read-only stream.
//!
//! [`SegmentedStream`] joins the payloads of an ordered list of volume
//! parts into one logical stream. Part boundaries are invisible to the
//! reader: when the active part is exhausted and declares a continuation,
//! the next part is opened and reading carries on within the same call.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::listener::{ExtractionListener, NoListener};
use crate::part::FilePart;
use crate::parts::{PartCursor, PartList};
use crate::{Error, Result};

/// A read-only, seekable stream spanning several volume parts.
///
/// The first part is opened on construction, so the stream is ready to read
/// immediately. A short read only ever happens at the end of the last part
/// of the entry; a missing or encrypted continuation is reported as an error.
///
/// # Example
///
/// ```rust
/// use std::io::Read;
/// use volspan::{MemoryPart, NoListener, PartHeader, SegmentedStream};
///
/// let parts = vec![
///     MemoryPart::new("a.part1.rar", PartHeader::new("a.bin", 10).split_after(true), vec![1u8; 10]),
///     MemoryPart::new("a.part2.rar", PartHeader::new("a.bin", 15).split_after(true), vec![2u8; 15]),
///     MemoryPart::new("a.part3.rar", PartHeader::new("a.bin", 7), vec![3u8; 7]),
/// ];
/// let mut stream = SegmentedStream::new(parts, NoListener)?;
///
/// let mut buf = [0u8; 40];
/// assert_eq!(stream.read(&mut buf)?, 32);
/// assert_eq!(&buf[9..11], &[1, 2]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SegmentedStream<P: FilePart, L = NoListener> {
    parts: PartList<P>,
    /// `None` once the stream is closed.
    cursor: Option<PartCursor>,
    active: Option<P::Payload>,
    position_in_part: u64,
    part_length: u64,
    part_bytes_read: u64,
    entry_bytes_read: u64,
    current_checksum: u32,
    listener: L,
}

impl<P: FilePart, L: ExtractionListener> SegmentedStream<P, L> {
    /// Creates a stream over `parts` and opens the first part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPartSequence`] if `parts` is empty, or the
    /// error raised while opening the first part.
    pub fn new(parts: impl IntoIterator<Item = P>, listener: L) -> Result<Self> {
        Self::from_part_list(PartList::new(parts)?, listener)
    }

    /// Creates a stream over an already materialized part list.
    pub fn from_part_list(parts: PartList<P>, listener: L) -> Result<Self> {
        let mut stream = Self {
            parts,
            cursor: None,
            active: None,
            position_in_part: 0,
            part_length: 0,
            part_bytes_read: 0,
            entry_bytes_read: 0,
            current_checksum: 0,
            listener,
        };
        let first = stream.parts.cursor_at(0);
        stream.activate(first)?;
        Ok(stream)
    }

    /// Opens the part at `cursor` and makes it the active part.
    ///
    /// The payload is opened before any state changes, so a failed open
    /// leaves the previous part active.
    fn activate(&mut self, cursor: PartCursor) -> Result<()> {
        let part = self.parts.part(&cursor);
        let payload = part.open_payload()?;
        let header = part.header();

        self.active = Some(payload);
        self.cursor = Some(cursor);
        self.part_length = header.compressed_size;
        self.position_in_part = 0;
        self.part_bytes_read = 0;
        self.current_checksum = header.checksum;

        log::debug!(
            "Activated part {} '{}' at logical offset {} ({} bytes)",
            cursor.index(),
            part.display_name(),
            cursor.start_offset(),
            header.compressed_size
        );
        self.listener.on_part_begin(
            part.display_name(),
            header.compressed_size,
            header.uncompressed_size,
        );
        Ok(())
    }

    /// Moves past the exhausted part at `cursor` into its continuation.
    fn advance(&mut self, cursor: PartCursor) -> Result<()> {
        let header = self.parts.part(&cursor).header();
        if header.is_encrypted() {
            return Err(Error::UnsupportedEncryptedContinuation {
                entry_name: header.entry_name.clone(),
            });
        }
        let Some(next) = self.parts.next_cursor(&cursor) else {
            return Err(Error::IncompleteMultiPart {
                entry_name: header.entry_name.clone(),
            });
        };
        self.activate(next)
    }

    /// Reads up to `buf.len()` bytes, crossing part boundaries as needed.
    ///
    /// As soon as a read consumes the last byte of a continuing part, the
    /// next part is activated within the same call, so a broken
    /// continuation fails the call that exhausted the part. Returns fewer
    /// bytes than requested only at the end of the last part of the entry.
    /// The listener's `on_bytes_read` fires once per successful call.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedEnd`] if a payload ends before its declared size
    /// - [`Error::IncompleteMultiPart`] if a continuation has no next part
    /// - [`Error::UnsupportedEncryptedContinuation`] if an encrypted part
    ///   continues
    /// - [`Error::Closed`] after [`close`](Self::close)
    pub fn read_segmented(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.cursor.is_none() {
            return Err(Error::Closed);
        }
        let mut total = 0usize;

        while total < buf.len() {
            let cursor = self.cursor.ok_or(Error::Closed)?;

            // Zero-length parts and seeks that land on a part end
            if self.position_in_part == self.part_length {
                if !self.parts.part(&cursor).header().split_after {
                    break;
                }
                self.advance(cursor)?;
                continue;
            }

            let remaining_in_part = self.part_length - self.position_in_part;
            let read_size = ((buf.len() - total) as u64).min(remaining_in_part) as usize;
            let active = self.active.as_mut().ok_or(Error::Closed)?;

            let n = match active.read(&mut buf[total..total + read_size]) {
                Ok(0) => {
                    return Err(Error::UnexpectedEnd {
                        part: self.parts.part(&cursor).display_name().to_string(),
                        position: self.position_in_part,
                        expected: self.part_length,
                    });
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            };

            self.position_in_part += n as u64;
            total += n;

            if self.position_in_part == self.part_length {
                if !self.parts.part(&cursor).header().split_after {
                    break;
                }
                self.advance(cursor)?;
            }
        }

        self.part_bytes_read += total as u64;
        self.entry_bytes_read += total as u64;
        log::trace!(
            "Read {} of {} requested bytes, logical offset now {}",
            total,
            buf.len(),
            self.logical_offset()
        );
        self.listener
            .on_bytes_read(self.part_bytes_read, self.entry_bytes_read);
        Ok(total)
    }

    /// Repositions the stream at logical `offset`.
    ///
    /// The containing part is found by a linear scan of part sizes, a fresh
    /// cursor is built for it and the part is reopened. Offsets past the end
    /// of the stream land at the end of the last part. The entry byte
    /// counter is left untouched.
    ///
    /// Returns the resulting logical offset, which equals `offset` unless it
    /// was clamped.
    pub fn seek_to(&mut self, offset: u64) -> Result<u64> {
        if self.cursor.is_none() {
            return Err(Error::Closed);
        }

        let total_size = self.parts.total_size();
        if offset > total_size {
            log::warn!(
                "Seek to {} is past the end of the stream ({} bytes), clamping to the last part",
                offset,
                total_size
            );
        }

        let cursor = self.parts.cursor_at(self.parts.locate(offset));
        self.activate(cursor)?;

        let intra_offset = offset
            .saturating_sub(cursor.start_offset())
            .min(self.part_length);
        if let Some(active) = self.active.as_mut() {
            active.seek(SeekFrom::Start(intra_offset))?;
        }
        self.position_in_part = intra_offset;

        Ok(cursor.start_offset() + intra_offset)
    }

    /// Returns the checksum of the active part.
    ///
    /// Only the active part's value is visible: for an entry split over
    /// several parts this is the checksum reported by whichever part is
    /// currently being read.
    pub fn current_checksum(&self) -> u32 {
        self.current_checksum
    }

    /// Returns the index of the active part, or `None` once closed.
    pub fn current_part_index(&self) -> Option<usize> {
        self.cursor.map(|cursor| cursor.index())
    }

    /// Returns the number of parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Bytes read since the active part was activated.
    pub fn part_bytes_read(&self) -> u64 {
        self.part_bytes_read
    }

    /// Bytes read over the stream's lifetime.
    pub fn entry_bytes_read(&self) -> u64 {
        self.entry_bytes_read
    }

    /// Returns the part list.
    pub fn parts(&self) -> &PartList<P> {
        &self.parts
    }

    /// Returns the listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Returns the listener mutably.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Consumes the stream and returns the listener.
    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Always `true`.
    pub fn can_read(&self) -> bool {
        true
    }

    /// Always `true`.
    pub fn can_seek(&self) -> bool {
        true
    }

    /// Always `false`.
    pub fn can_write(&self) -> bool {
        false
    }

    /// Length queries are not supported.
    ///
    /// Callers track offsets through the return values of
    /// [`seek_to`](Self::seek_to) and read counts.
    pub fn length(&self) -> Result<u64> {
        Err(Error::NotSupported { operation: "length" })
    }

    /// Position queries are not supported.
    pub fn position(&self) -> Result<u64> {
        Err(Error::NotSupported {
            operation: "position",
        })
    }

    /// Resizing is not supported.
    pub fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::NotSupported {
            operation: "set_len",
        })
    }

    /// Releases the active payload stream.
    ///
    /// Every later read or seek fails with [`Error::Closed`]. Calling this
    /// more than once has no further effect.
    pub fn close(&mut self) {
        if self.cursor.take().is_some() {
            log::debug!("Closing segmented stream after {} bytes", self.entry_bytes_read);
        }
        self.active = None;
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    fn logical_offset(&self) -> u64 {
        self.cursor
            .map_or(0, |cursor| cursor.start_offset() + self.position_in_part)
    }
}

impl<P: FilePart, L: ExtractionListener> Read for SegmentedStream<P, L> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_segmented(buf).map_err(io::Error::from)
    }
}

/// Only [`SeekFrom::Start`] is supported; relative seeks would need the
/// current position, which the stream does not expose.
impl<P: FilePart, L: ExtractionListener> Seek for SegmentedStream<P, L> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(offset) => self.seek_to(offset).map_err(io::Error::from),
            SeekFrom::End(_) | SeekFrom::Current(_) => Err(Error::NotSupported {
                operation: "relative seek",
            }
            .into()),
        }
    }
}

impl<P: FilePart, L: ExtractionListener> Write for SegmentedStream<P, L> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(Error::NotSupported { operation: "write" }.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(Error::NotSupported { operation: "flush" }.into())
    }
}

impl<P: FilePart, L> std::fmt::Debug for SegmentedStream<P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedStream")
            .field("part_count", &self.parts.len())
            .field("total_size", &self.parts.total_size())
            .field("current_part", &self.cursor.map(|c| c.index()))
            .field("position_in_part", &self.position_in_part)
            .field("part_length", &self.part_length)
            .field("entry_bytes_read", &self.entry_bytes_read)
            .finish()
    }
}
