//! File-backed volume parts.
//!
//! A split archive is stored as a series of volume files (for example
//! `movie.part1.rar`, `movie.part2.rar`, ... or `archive.7z.001`,
//! `archive.7z.002`, ...). Each volume holds its own headers followed by
//! the slice of the entry's compressed payload it carries. Header parsing is
//! up to the caller; a [`VolumePart`] only needs to know where in the file
//! the payload starts and the [`PartHeader`] describing it.
//!
//! # Example
//!
//! ```rust,no_run
//! use volspan::volume::VolumePart;
//! use volspan::{NoListener, PartHeader, SegmentedStream};
//!
//! let parts = vec![
//!     VolumePart::new("movie.part1.rar", 1, 84, PartHeader::new("movie.mkv", 1_000_000).split_after(true)),
//!     VolumePart::new("movie.part2.rar", 2, 84, PartHeader::new("movie.mkv", 250_000)),
//! ];
//! let mut stream = SegmentedStream::new(parts, NoListener)?;
//! std::io::copy(&mut stream, &mut std::io::sink())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::part::{FilePart, PartHeader};
use crate::{Error, Result};

/// A part whose payload lives at an offset inside a volume file.
#[derive(Debug, Clone)]
pub struct VolumePart {
    path: PathBuf,
    name: String,
    volume: u32,
    data_offset: u64,
    header: PartHeader,
}

impl VolumePart {
    /// Creates a volume part.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the volume file
    /// * `volume` - 1-based volume number, used in error reports
    /// * `data_offset` - Offset of the payload within the file
    /// * `header` - Metadata of the part
    pub fn new(path: impl AsRef<Path>, volume: u32, data_offset: u64, header: PartHeader) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            name,
            volume,
            data_offset,
            header,
        }
    }

    /// Returns the path of the volume file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the 1-based volume number.
    pub fn volume(&self) -> u32 {
        self.volume
    }

    /// Returns the offset of the payload within the volume file.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }
}

impl FilePart for VolumePart {
    type Payload = PartWindow<BufReader<File>>;

    fn header(&self) -> &PartHeader {
        &self.header
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn open_payload(&self) -> Result<Self::Payload> {
        let file = File::open(&self.path).map_err(|e| Error::VolumeMissing {
            volume: self.volume,
            path: self.path.to_string_lossy().to_string(),
            source: e,
        })?;
        let window = PartWindow::new(
            BufReader::new(file),
            self.data_offset,
            self.header.compressed_size,
        )?;
        Ok(window)
    }
}

/// A bounded, seekable view over `[start, start + len)` of an inner reader.
///
/// Reads never go past the end of the window even if the inner reader has
/// more data. Seek positions are relative to the window start.
pub struct PartWindow<R> {
    inner: R,
    start: u64,
    len: u64,
    position: u64,
}

impl<R: Read + Seek> PartWindow<R> {
    /// Creates a window and positions the inner reader at `start`.
    pub fn new(mut inner: R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            start,
            len,
            position: 0,
        })
    }
}

impl<R> PartWindow<R> {
    /// Returns the window length.
    pub fn window_len(&self) -> u64 {
        self.len
    }

    /// Returns the number of bytes left before the window end.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Consumes the window and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for PartWindow<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let to_read = (buf.len() as u64).min(remaining) as usize;
        let n = self.inner.read(&mut buf[..to_read])?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Seek> Seek for PartWindow<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(p) => self.len.checked_add_signed(p),
            SeekFrom::Current(p) => self.position.checked_add_signed(p),
        };

        let Some(new_pos) = new_pos else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot seek before start of part window",
            ));
        };

        let Some(absolute) = self.start.checked_add(new_pos) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Seek position overflows the part window",
            ));
        };

        self.inner.seek(SeekFrom::Start(absolute))?;
        self.position = new_pos;
        Ok(self.position)
    }
}

impl<R> std::fmt::Debug for PartWindow<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartWindow")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("position", &self.position)
            .finish()
    }
}
