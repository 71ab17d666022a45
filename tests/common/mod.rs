//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use volspan::{MemoryPart, PartHeader, VolumePart};

/// Name of the entry every test part belongs to.
pub const ENTRY_NAME: &str = "payload.bin";

/// Bytes of fake volume header written before each volume's payload.
pub const VOLUME_HEADER: &[u8] = b"RAR-VOLUME-HEADER";

/// Byte stored at logical offset `offset` of the test stream.
///
/// 251 is prime, so part boundaries never line up with the pattern period.
pub fn byte_at(offset: u64) -> u8 {
    (offset % 251) as u8
}

/// The full logical stream for parts of the given sizes.
pub fn expected_stream(sizes: &[usize]) -> Vec<u8> {
    let total: usize = sizes.iter().sum();
    (0..total as u64).map(byte_at).collect()
}

/// Splits the expected stream into per-part payloads.
pub fn payloads(sizes: &[usize]) -> Vec<Vec<u8>> {
    let mut offset = 0u64;
    sizes
        .iter()
        .map(|&size| {
            let data = (offset..offset + size as u64).map(byte_at).collect();
            offset += size as u64;
            data
        })
        .collect()
}

/// Header for part `index` of `count`; every part but the last continues.
pub fn header(index: usize, count: usize, size: usize) -> PartHeader {
    PartHeader::new(ENTRY_NAME, size as u64)
        .uncompressed_size(size as u64 * 3)
        .checksum(0xC0DE_0000 + index as u32)
        .split_after(index + 1 < count)
}

/// Display name of part `index`.
pub fn part_name(index: usize) -> String {
    format!("payload.part{}.rar", index + 1)
}

/// Creates in-memory parts for the given sizes.
pub fn memory_parts(sizes: &[usize]) -> Vec<MemoryPart> {
    payloads(sizes)
        .into_iter()
        .enumerate()
        .map(|(i, data)| MemoryPart::new(part_name(i), header(i, sizes.len(), data.len()), data))
        .collect()
}

/// Writes one volume file per part into `dir` and returns file-backed parts.
///
/// Each file holds [`VOLUME_HEADER`], the payload, then a trailer that must
/// never be read.
pub fn volume_parts(dir: &Path, sizes: &[usize]) -> Vec<VolumePart> {
    payloads(sizes)
        .into_iter()
        .enumerate()
        .map(|(i, data)| {
            let path = dir.join(part_name(i));
            let mut file = File::create(&path).unwrap();
            file.write_all(VOLUME_HEADER).unwrap();
            file.write_all(&data).unwrap();
            file.write_all(b"TRAILER").unwrap();

            VolumePart::new(
                &path,
                (i + 1) as u32,
                VOLUME_HEADER.len() as u64,
                header(i, sizes.len(), data.len()),
            )
        })
        .collect()
}
