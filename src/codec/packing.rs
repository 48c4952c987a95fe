//! Grayscale conversion and nibble packing

/// BT.601 luma in 16.16 fixed point, rounded to nearest
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Pack 8-bit samples into 4-bit pairs.
///
/// Each sample keeps its upper four bits. The first sample of a pair lands in
/// the low nibble; an odd trailing sample leaves the high nibble zero.
pub fn pack_4bit(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks(2)
        .map(|pair| {
            let first = pair[0] >> 4;
            let second = pair.get(1).map_or(0, |s| s >> 4);
            (second << 4) | first
        })
        .collect()
}
