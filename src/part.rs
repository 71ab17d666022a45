//! Volume part metadata and the part provider contract.
//!
//! A split archive stores the compressed bytes of one logical entry across
//! several physical parts. Each part knows how many payload bytes it holds,
//! whether the entry continues in the next part, and how to open a fresh
//! stream over its own payload. [`SegmentedStream`](crate::SegmentedStream)
//! consumes parts only through the [`FilePart`] trait.
//!
//! # Example
//!
//! ```rust
//! use std::io::Read;
//! use volspan::{FilePart, MemoryPart, PartHeader};
//!
//! let part = MemoryPart::new(
//!     "video.part1.rar",
//!     PartHeader::new("video.mkv", 5)
//!         .uncompressed_size(12)
//!         .checksum(0x1234_5678)
//!         .split_after(true),
//!     b"hello".to_vec(),
//! );
//!
//! let mut payload = Vec::new();
//! part.open_payload()?.read_to_end(&mut payload)?;
//! assert_eq!(payload, b"hello");
//! assert!(part.header().split_after);
//! # Ok::<(), volspan::Error>(())
//! ```

use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use crate::Result;

/// Metadata of one volume part, as read from the part's header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeader {
    /// Name of the logical entry whose data this part carries.
    pub entry_name: String,
    /// Bytes of payload physically stored in this part.
    pub compressed_size: u64,
    /// Uncompressed size reported for the entry. Informational only.
    pub uncompressed_size: u64,
    /// Checksum associated with the entry as of this part.
    pub checksum: u32,
    /// `true` if the entry's data continues in the next part.
    pub split_after: bool,
    /// Present if this part's data is encrypted (for example a key salt).
    pub encryption_marker: Option<Vec<u8>>,
}

impl PartHeader {
    /// Creates a header for a part holding `compressed_size` payload bytes
    /// of `entry_name`.
    pub fn new(entry_name: impl Into<String>, compressed_size: u64) -> Self {
        Self {
            entry_name: entry_name.into(),
            compressed_size,
            ..Self::default()
        }
    }

    /// Sets the uncompressed size.
    pub fn uncompressed_size(mut self, size: u64) -> Self {
        self.uncompressed_size = size;
        self
    }

    /// Sets the checksum.
    pub fn checksum(mut self, checksum: u32) -> Self {
        self.checksum = checksum;
        self
    }

    /// Marks whether the entry continues in the next part.
    pub fn split_after(mut self, split_after: bool) -> Self {
        self.split_after = split_after;
        self
    }

    /// Sets the encryption marker.
    pub fn encryption_marker(mut self, marker: impl Into<Vec<u8>>) -> Self {
        self.encryption_marker = Some(marker.into());
        self
    }

    /// Returns `true` if the part carries an encryption marker.
    pub fn is_encrypted(&self) -> bool {
        self.encryption_marker.is_some()
    }
}

/// A physically stored part of a split archive.
///
/// `open_payload` may be called any number of times; every call must
/// return an independent stream positioned at offset 0 of the part's
/// compressed payload.
pub trait FilePart {
    /// Stream type over the part's payload.
    type Payload: Read + Seek;

    /// Returns the part's header metadata.
    fn header(&self) -> &PartHeader;

    /// Human-readable identifier used for progress reporting.
    fn display_name(&self) -> &str;

    /// Opens a fresh stream over this part's compressed payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing volume is missing or unreadable.
    fn open_payload(&self) -> Result<Self::Payload>;
}

impl<P: FilePart + ?Sized> FilePart for &P {
    type Payload = P::Payload;

    fn header(&self) -> &PartHeader {
        (**self).header()
    }

    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn open_payload(&self) -> Result<Self::Payload> {
        (**self).open_payload()
    }
}

impl<P: FilePart + ?Sized> FilePart for Box<P> {
    type Payload = P::Payload;

    fn header(&self) -> &PartHeader {
        (**self).header()
    }

    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn open_payload(&self) -> Result<Self::Payload> {
        (**self).open_payload()
    }
}

impl<P: FilePart + ?Sized> FilePart for Arc<P> {
    type Payload = P::Payload;

    fn header(&self) -> &PartHeader {
        (**self).header()
    }

    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn open_payload(&self) -> Result<Self::Payload> {
        (**self).open_payload()
    }
}

/// A part whose payload is held in memory.
///
/// The payload is shared, so opening it is cheap and every opened stream
/// is independent.
#[derive(Clone)]
pub struct MemoryPart {
    name: String,
    header: PartHeader,
    data: Arc<[u8]>,
}

impl MemoryPart {
    /// Creates an in-memory part.
    ///
    /// `header.compressed_size` is taken as given; it may declare fewer
    /// bytes than `data` holds, in which case the trailing bytes are never
    /// read through a segmented stream.
    pub fn new(name: impl Into<String>, header: PartHeader, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            header,
            data: data.into(),
        }
    }

    /// Creates a part whose declared compressed size is the length of `data`.
    pub fn from_payload(
        name: impl Into<String>,
        entry_name: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        let data = data.into();
        let header = PartHeader::new(entry_name, data.len() as u64);
        Self::new(name, header, data)
    }

    /// Returns the header for modification.
    pub fn header_mut(&mut self) -> &mut PartHeader {
        &mut self.header
    }

    /// Returns the raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl FilePart for MemoryPart {
    type Payload = Cursor<Arc<[u8]>>;

    fn header(&self) -> &PartHeader {
        &self.header
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn open_payload(&self) -> Result<Self::Payload> {
        Ok(Cursor::new(Arc::clone(&self.data)))
    }
}

impl std::fmt::Debug for MemoryPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPart")
            .field("name", &self.name)
            .field("header", &self.header)
            .field("data_len", &self.data.len())
            .finish()
    }
}
