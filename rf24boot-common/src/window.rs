//! Address arithmetic for chunked partition transfers.
//!
//! Nothing here knows about the link: given where a transfer stands and the
//! partition geometry, it decides how many blocks fit into the next round
//! trip, how much filler a write needs and when a read stream is over.

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    pub size: u32,
    pub io_size: u32,
    pub pad: u32,
}

impl Geometry {
    pub fn new(size: u32, io_size: u32, pad: u32) -> Self {
        Self {
            size,
            io_size,
            pad: pad.max(1),
        }
    }
}

/// Blocks that may be queued starting at `address`, at most `window`.
pub fn blocks_to_queue(address: u32, geometry: &Geometry, window: usize) -> usize {
    if address >= geometry.size || geometry.io_size == 0 {
        return 0;
    }
    let remaining = ((geometry.size - address) / geometry.io_size) as usize;
    window.min(remaining)
}

/// `true` for the address of the final block of the partition.
#[inline]
pub fn is_last_block(address: u32, geometry: &Geometry) -> bool {
    geometry
        .size
        .checked_sub(geometry.io_size)
        .map_or(false, |last| address == last)
}

/// Filler blocks to append after a write pass that stored `written` bytes
/// and left the device address at the block aligned `end`.
///
/// Nothing is added when `written` is already pad aligned, and a block is
/// never placed where it would cross the end of the partition.
pub fn padding_blocks(written: u32, end: u32, geometry: &Geometry) -> usize {
    if geometry.io_size == 0 || written % geometry.pad == 0 {
        return 0;
    }

    let (size, io_size, pad) = (
        geometry.size as u64,
        geometry.io_size as u64,
        geometry.pad as u64,
    );
    let mut address = end as u64;
    let mut count = 0;
    while address % pad != 0 && address + io_size <= size {
        address += io_size;
        count += 1;
    }
    count
}
