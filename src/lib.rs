//! # volspan
//!
//! A read-only, seekable byte stream over the parts of a split
//! (multi-volume) archive.
//!
//! Split archive formats store the compressed bytes of a single entry
//! across several volume files. This crate joins those slices back into one
//! logical stream that a decompressor, a CRC verifier or a copy routine can
//! consume through [`std::io::Read`] and [`std::io::Seek`] without knowing
//! where one volume ends and the next begins.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Read;
//! use volspan::{MemoryPart, PartHeader, SegmentedStream, listener::StatisticsListener};
//!
//! fn main() -> volspan::Result<()> {
//!     let parts = vec![
//!         MemoryPart::new("photo.part1.rar", PartHeader::new("photo.jpg", 4).split_after(true), b"JPEG".to_vec()),
//!         MemoryPart::new("photo.part2.rar", PartHeader::new("photo.jpg", 4), b"DATA".to_vec()),
//!     ];
//!
//!     let mut stream = SegmentedStream::new(parts, StatisticsListener::new())?;
//!     let mut data = Vec::new();
//!     stream.read_to_end(&mut data)?;
//!
//!     assert_eq!(data, b"JPEGDATA");
//!     assert_eq!(stream.listener().parts_started(), 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Building Blocks
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`SegmentedStream`] | The logical stream |
//! | [`FilePart`] | Contract a volume part implements |
//! | [`MemoryPart`], [`volume::VolumePart`] | In-memory and file-backed parts |
//! | [`PartList`] | Materialized part sequence with offset lookup |
//! | [`ExtractionListener`] | Progress notifications |
//! | [`checksum::Crc32Reader`] | CRC-32 verification of stored entries |
//!
//! ## Error Handling
//!
//! All inherent operations return [`Result<T>`]. Part boundaries only
//! become visible when something is wrong with them:
//!
//! ```rust
//! use volspan::{Error, MemoryPart, NoListener, PartHeader, SegmentedStream};
//!
//! let part = MemoryPart::new(
//!     "big.part1.rar",
//!     PartHeader::new("big.iso", 2).split_after(true),
//!     vec![0u8, 1],
//! );
//! let mut stream = SegmentedStream::new(vec![part], NoListener).unwrap();
//!
//! let mut buf = [0u8; 8];
//! match stream.read_segmented(&mut buf) {
//!     Err(Error::IncompleteMultiPart { entry_name }) => {
//!         eprintln!("Insert the next volume for {}", entry_name);
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: part activations at `debug`,
//! clamped seeks at `warn` and individual reads at `trace`. No logger is
//! installed by the library.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod checksum;
pub mod error;
pub mod listener;
pub mod part;
pub mod parts;
pub mod stream;
pub mod volume;

pub use error::{Error, Result};
pub use listener::{ExtractionListener, NoListener};
pub use part::{FilePart, MemoryPart, PartHeader};
pub use parts::{PartCursor, PartList};
pub use stream::SegmentedStream;
pub use volume::{PartWindow, VolumePart};
