//! Checksum computation utilities.
//!
//! Volume parts carry the CRC-32 of the entry they belong to, and a
//! [`SegmentedStream`](crate::SegmentedStream) exposes the value of the
//! active part through
//! [`current_checksum`](crate::SegmentedStream::current_checksum). For
//! stored (uncompressed) entries the payload can be verified directly by
//! reading it through a [`Crc32Reader`].
//!
//! # Example
//!
//! ```rust
//! use volspan::checksum::Crc32;
//!
//! let mut crc32 = Crc32::new();
//! crc32.update(b"Hello, ");
//! crc32.update(b"World!");
//! assert_eq!(crc32.finalize(), Crc32::compute(b"Hello, World!"));
//! ```

use std::io::{self, Read};

use crate::{Error, Result};

/// CRC-32 checksum calculator.
///
/// Uses the IEEE 802.3 polynomial (standard for Ethernet, ZIP, RAR, 7z).
///
/// ```rust
/// use volspan::checksum::Crc32;
///
/// assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
/// ```
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    /// Creates a new CRC-32 calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of everything seen so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Computes the CRC-32 of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.finalize())
            .finish()
    }
}

/// A reader wrapper that computes CRC-32 while reading.
///
/// # Example
///
/// ```rust
/// use volspan::checksum::Crc32Reader;
/// use std::io::{Cursor, Read};
///
/// let mut reader = Crc32Reader::new(Cursor::new(b"Hello, World!"));
///
/// let mut buffer = Vec::new();
/// reader.read_to_end(&mut buffer).unwrap();
///
/// assert_eq!(reader.crc(), 0xEC4AC3D0);
/// assert!(reader.verify(0xEC4AC3D0, None).is_ok());
/// ```
pub struct Crc32Reader<R> {
    inner: R,
    crc: Crc32,
    bytes_read: u64,
}

impl<R> Crc32Reader<R> {
    /// Creates a new CRC-32 reader wrapping the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_read: 0,
        }
    }

    /// Returns the CRC-32 of everything read so far.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Returns the number of bytes read.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Compares the CRC of everything read so far against `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CrcMismatch`] if the values differ.
    pub fn verify(&self, expected: u32, entry_name: Option<&str>) -> Result<()> {
        let actual = self.crc();
        if actual != expected {
            return Err(Error::CrcMismatch {
                entry_name: entry_name.map(str::to_string),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Returns a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns a mutable reference to the inner reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consumes the wrapper and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}
