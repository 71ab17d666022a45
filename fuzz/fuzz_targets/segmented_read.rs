//! Fuzz target for SegmentedStream with arbitrary part layouts.
//!
//! The first byte selects the part count, the following bytes the declared
//! part sizes, and the rest is dealt out as payload. Declared sizes do not
//! have to match the payload, which exercises the truncation and
//! continuation error paths as well as seeks past the end.
//!
//! Run with: cargo +nightly fuzz run segmented_read

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Read;
use volspan::{MemoryPart, NoListener, PartHeader, SegmentedStream};

fuzz_target!(|data: &[u8]| {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let count = (count % 8) as usize + 1;
    if rest.len() < count {
        return;
    }
    let (sizes, mut payload) = rest.split_at(count);

    let mut parts = Vec::with_capacity(count);
    for (i, &size) in sizes.iter().enumerate() {
        let take = (size as usize).min(payload.len());
        let (chunk, tail) = payload.split_at(take);
        payload = tail;

        // Odd declared sizes overstate the payload by one byte
        let declared = size as u64 + (size % 2) as u64;
        let header = PartHeader::new("fuzz.bin", declared)
            .split_after(i + 1 < count || size % 3 == 0)
            .checksum(size as u32);
        parts.push(MemoryPart::new(format!("fuzz.part{}", i + 1), header, chunk.to_vec()));
    }

    let Ok(mut stream) = SegmentedStream::new(parts, NoListener) else {
        return;
    };

    // We don't care about the result - we're looking for panics or hangs
    let mut out = Vec::new();
    let _ = stream.read_to_end(&mut out);

    for &offset in sizes {
        let _ = stream.seek_to(offset as u64 * 3);
        let mut buf = [0u8; 17];
        let _ = stream.read_segmented(&mut buf);
    }

    stream.close();
    let _ = stream.seek_to(0);
});
