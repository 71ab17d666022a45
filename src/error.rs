//! Error types for segmented stream operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when reading a logical stream that spans several volume
//! parts, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! The inherent methods of [`SegmentedStream`](crate::SegmentedStream)
//! return `Result<T, Error>`. The [`std::io::Read`] and [`std::io::Seek`]
//! implementations return [`std::io::Error`] instead; the original [`Error`]
//! travels inside it and can be recovered with [`Error::from_io`]:
//!
//! ```rust
//! use std::io::Read;
//! use volspan::{Error, MemoryPart, NoListener, PartHeader, SegmentedStream};
//!
//! let part = MemoryPart::new(
//!     "data.part1.rar",
//!     PartHeader::new("data.bin", 4).split_after(true),
//!     vec![1u8, 2, 3, 4],
//! );
//! let mut stream = SegmentedStream::new(vec![part], NoListener).unwrap();
//!
//! let mut buf = Vec::new();
//! let err = stream.read_to_end(&mut buf).unwrap_err();
//! match Error::from_io(err) {
//!     Error::IncompleteMultiPart { entry_name } => assert_eq!(entry_name, "data.bin"),
//!     other => panic!("unexpected error: {other}"),
//! }
//! ```

use std::io;

/// The main error type for segmented stream operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Construction | [`EmptyPartSequence`][Self::EmptyPartSequence], [`SizeOverflow`][Self::SizeOverflow] | No parts supplied, corrupt part sizes |
/// | I/O | [`Io`][Self::Io], [`UnexpectedEnd`][Self::UnexpectedEnd], [`VolumeMissing`][Self::VolumeMissing] | Volume files and payload streams |
/// | Format | [`IncompleteMultiPart`][Self::IncompleteMultiPart], [`UnsupportedEncryptedContinuation`][Self::UnsupportedEncryptedContinuation] | Broken or unsupported continuations |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch] | Data corruption |
/// | Capability | [`NotSupported`][Self::NotSupported], [`Closed`][Self::Closed] | Misuse of the stream |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error reported by an underlying payload stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A segmented stream was constructed from an empty part sequence.
    #[error("Cannot create a segmented stream from an empty part sequence")]
    EmptyPartSequence,

    /// The declared part sizes add up to more than a `u64` can address.
    #[error("Declared size {compressed_size} of part '{part}' overflows the logical stream length")]
    SizeOverflow {
        /// Display name of the part whose size overflowed the total.
        part: String,
        /// Declared compressed size of that part.
        compressed_size: u64,
    },

    /// A payload stream ended before the part's declared compressed size
    /// was consumed.
    #[error("Unexpected end of part '{part}' at offset {position} (declared size {expected})")]
    UnexpectedEnd {
        /// Display name of the part that was cut short.
        part: String,
        /// Bytes consumed from the part when the stream ran dry.
        position: u64,
        /// Declared compressed size of the part.
        expected: u64,
    },

    /// A volume file could not be opened.
    ///
    /// This is recoverable: the caller can ask the user for the missing
    /// volume and retry.
    #[error("Volume {volume} missing or unreadable: {path}")]
    VolumeMissing {
        /// The 1-based volume number.
        volume: u32,
        /// Path of the missing volume file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A part declared that its entry continues in the next part, but no
    /// further part exists.
    #[error("Multi-part archive is incomplete. Entry expects a new volume: {entry_name}")]
    IncompleteMultiPart {
        /// Name of the entry that was cut off.
        entry_name: String,
    },

    /// A continuation was requested out of an encrypted part.
    ///
    /// Decryption across volume boundaries is not implemented.
    #[error("Multi-volume decryption is not supported (entry: {entry_name})")]
    UnsupportedEncryptedContinuation {
        /// Name of the encrypted entry.
        entry_name: String,
    },

    /// Checksum verification failed.
    #[error("{}", CrcMismatchDisplay { entry_name: entry_name.as_deref(), expected: *expected, actual: *actual })]
    CrcMismatch {
        /// Name of the entry that failed verification, if known.
        entry_name: Option<String>,
        /// Expected checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// The operation is outside the read/seek capability set.
    #[error("Operation not supported on a read-only segmented stream: {operation}")]
    NotSupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The stream was closed.
    #[error("Segmented stream has been closed")]
    Closed,
}

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    entry_name: Option<&'a str>,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CRC mismatch")?;
        if let Some(name) = self.entry_name {
            write!(f, " for '{}'", name)?;
        }
        write!(f, ": expected {:#x}, got {:#x}", self.expected, self.actual)
    }
}

impl Error {
    /// Returns `true` if the archive layout itself is broken or uses an
    /// unsupported continuation.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::IncompleteMultiPart { .. }
                | Error::UnsupportedEncryptedContinuation { .. }
                | Error::SizeOverflow { .. }
        )
    }

    /// Returns `true` if the caller asked for something the stream cannot do.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::NotSupported { .. } | Error::UnsupportedEncryptedContinuation { .. }
        )
    }

    /// Returns `true` if this error might be recoverable.
    ///
    /// - `VolumeMissing`: the user can provide the missing volume file
    /// - `Io` (transient kinds only): retry may succeed for `WouldBlock`,
    ///   `Interrupted`, `TimedOut`
    ///
    /// Nothing is retried internally; retrying is the caller's decision.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::VolumeMissing { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::IncompleteMultiPart { entry_name } => Some(entry_name.as_str()),
            Error::UnsupportedEncryptedContinuation { entry_name } => Some(entry_name.as_str()),
            Error::CrcMismatch { entry_name, .. } => entry_name.as_deref(),
            _ => None,
        }
    }

    /// Recovers the crate error from an [`io::Error`] produced by the
    /// `Read`/`Seek`/`Write` implementations.
    ///
    /// I/O errors that did not originate from this crate are wrapped in
    /// [`Error::Io`].
    pub fn from_io(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(error)) => *error,
            Some(Err(inner)) => Error::Io(io::Error::new(kind, inner)),
            None => Error::Io(io::Error::from(kind)),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            e @ Error::UnexpectedEnd { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e @ Error::NotSupported { .. } => io::Error::new(io::ErrorKind::Unsupported, e),
            e @ Error::VolumeMissing { .. } => io::Error::new(io::ErrorKind::NotFound, e),
            e @ Error::SizeOverflow { .. } => io::Error::new(io::ErrorKind::InvalidData, e),
            e => io::Error::other(e),
        }
    }
}

/// A specialized Result type for segmented stream operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_incomplete_multi_part() {
        let err = Error::IncompleteMultiPart {
            entry_name: "movie.mkv".into(),
        };
        assert_eq!(
            err.to_string(),
            "Multi-part archive is incomplete. Entry expects a new volume: movie.mkv"
        );
        assert!(err.is_format_error());
        assert!(!err.is_unsupported());
        assert_eq!(err.entry_name(), Some("movie.mkv"));
    }

    #[test]
    fn test_unsupported_encrypted_continuation() {
        let err = Error::UnsupportedEncryptedContinuation {
            entry_name: "secret.txt".into(),
        };
        assert!(err.to_string().contains("decryption"));
        assert!(err.is_format_error());
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_unexpected_end() {
        let err = Error::UnexpectedEnd {
            part: "a.part2.rar".into(),
            position: 12,
            expected: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("a.part2.rar"));
        assert!(msg.contains("12"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn test_size_overflow() {
        let err = Error::SizeOverflow {
            part: "x.part2.rar".into(),
            compressed_size: 7,
        };
        assert!(err.to_string().contains("x.part2.rar"));
        assert!(err.is_format_error());

        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_crc_mismatch() {
        let err = Error::CrcMismatch {
            entry_name: None,
            expected: 0xDEADBEEF,
            actual: 0xCAFEBABE,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("0xcafebabe"));

        let err = Error::CrcMismatch {
            entry_name: Some("path/to/file.txt".into()),
            expected: 1,
            actual: 2,
        };
        assert!(err.to_string().contains("path/to/file.txt"));
        assert_eq!(err.entry_name(), Some("path/to/file.txt"));
    }

    #[test]
    fn test_volume_missing_with_source() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = Error::VolumeMissing {
            volume: 2,
            path: "test.part2.rar".into(),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Volume 2"), "Should show volume number");
        assert!(msg.contains("test.part2.rar"), "Should show path");
        assert!(
            std::error::Error::source(&err).is_some(),
            "Source chain should be preserved"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_is_recoverable_io_kinds() {
        let transient = Error::Io(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        assert!(transient.is_recoverable());

        let fatal = Error::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(!fatal.is_recoverable());
        assert!(!Error::EmptyPartSequence.is_recoverable());
    }

    #[test]
    fn test_io_conversion_kinds() {
        let io_err: io::Error = Error::NotSupported { operation: "write" }.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);

        let io_err: io::Error = Error::UnexpectedEnd {
            part: "p".into(),
            position: 0,
            expected: 1,
        }
        .into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);

        let io_err: io::Error = Error::Closed.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);

        let original = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let io_err: io::Error = Error::Io(original).into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_from_io_recovers_payload() {
        let io_err: io::Error = Error::IncompleteMultiPart {
            entry_name: "x".into(),
        }
        .into();
        assert!(matches!(
            Error::from_io(io_err),
            Error::IncompleteMultiPart { .. }
        ));

        let plain = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        match Error::from_io(plain) {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
