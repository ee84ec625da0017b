//! Resource-table lookups.
//!
//! The table is a flat array of 24-bit little-endian offsets located by
//! the header pointer; the firmware indexes it with 24-bit resource ids.

use crate::error::RuntimeError;
use crate::rom::{RomImage, read_u24_le};

/// Resolve an image resource id to its ROM offset.
///
/// Two bounds checks guard the lookup: the table entry itself must lie
/// inside the image, and the offset it names must leave room for an image
/// header. The firmware never requests an invalid id in normal play, so
/// both failures are fatal.
pub fn image_offset(rom: &RomImage, id: u32) -> Result<usize, RuntimeError> {
    let data = rom.bytes();
    let entry = rom.header().resource_table as usize + 3 * id as usize;
    if entry + 3 > data.len() {
        return Err(RuntimeError::BadResource { id });
    }
    let offset = read_u24_le(data, entry) as usize;
    if offset + 4 > data.len() {
        return Err(RuntimeError::BadResource { id });
    }
    Ok(offset)
}
