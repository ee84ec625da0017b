//! Cartridge ROM container: loading, validation, deobfuscation.
//!
//! A dump is a 4 MiB (model 550) or 8 MiB (model 560) flash image. The
//! whole image may be XOR-masked by a one-byte key derived from the magic
//! at offset 0x23; the container stores the clear form and re-applies the
//! key whenever save-region bytes cross the file boundary.

use std::path::Path;

/// Smallest dump worth parsing: one save region plus a header.
pub const MIN_ROM_SIZE: usize = 64 << 10;
/// Largest supported dump (model 560).
pub const MAX_ROM_SIZE: usize = 8 << 20;
/// The save region is the last 64 KiB of the image.
pub const SAVE_REGION_SIZE: usize = 0x10000;

const MAGIC: &[u8; 4] = b"tony";
const MAGIC_OFFSET: usize = 0x23;

/// Errors that can occur while loading a cartridge dump.
#[derive(Debug)]
pub enum RomError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),
    /// Image smaller than the minimum dump size.
    TooSmall(usize),
    /// Image larger than any supported model.
    TooLarge(usize),
    /// Magic bytes at 0x23 do not decode to the expected tag.
    BadMagic([u8; 4]),
    /// Resource-table pointer beyond the end of the image.
    BadResourceTable { offset: usize, len: usize },
}

impl std::fmt::Display for RomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::TooSmall(len) => write!(f, "ROM too small: {len} bytes"),
            Self::TooLarge(len) => write!(f, "ROM too large: {len} bytes"),
            Self::BadMagic(bytes) => write!(f, "bad ROM magic {bytes:02X?}"),
            Self::BadResourceTable { offset, len } => {
                write!(f, "resource table at 0x{offset:06X} beyond ROM end 0x{len:06X}")
            }
        }
    }
}

impl std::error::Error for RomError {}

impl From<std::io::Error> for RomError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Hardware model, decided by dump size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Model {
    Tp550,
    Tp560,
}

impl Model {
    pub fn screen_height(self) -> usize {
        match self {
            Self::Tp550 => 128,
            Self::Tp560 => 160,
        }
    }
}

/// A ROM-call frame recorded in the header: ROM address plus size in
/// 16-bit words.
#[derive(Copy, Clone, Debug)]
pub struct FrameRef {
    pub addr: u32,
    pub words: u16,
}

/// Parsed header fields (offsets are into the deobfuscated image).
#[derive(Copy, Clone, Debug)]
pub struct RomHeader {
    pub resource_table: u32,
    pub boot: FrameRef,
    pub font: u16,
    pub tick: FrameRef,
}

pub struct RomImage {
    data: Vec<u8>,
    key: u8,
    header: RomHeader,
}

impl RomImage {
    /// Read a dump from disk and validate it.
    pub fn load(path: &Path) -> Result<Self, RomError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Validate a dump and strip the XOR obfuscation.
    pub fn from_bytes(mut data: Vec<u8>) -> Result<Self, RomError> {
        if data.len() < MIN_ROM_SIZE {
            return Err(RomError::TooSmall(data.len()));
        }
        if data.len() > MAX_ROM_SIZE {
            return Err(RomError::TooLarge(data.len()));
        }

        let key = data[MAGIC_OFFSET] ^ MAGIC[0];
        let found: [u8; 4] = data[MAGIC_OFFSET..MAGIC_OFFSET + 4].try_into().unwrap();
        if found.iter().zip(MAGIC).any(|(&b, &m)| b != m ^ key) {
            return Err(RomError::BadMagic(found));
        }
        if key != 0 {
            for b in &mut data {
                *b ^= key;
            }
        }

        let header = RomHeader {
            resource_table: read_u24_le(&data, 0),
            boot: FrameRef {
                addr: read_u16_le(&data, 3) as u32,
                words: read_u16_le(&data, 5),
            },
            font: read_u16_le(&data, 7),
            tick: FrameRef {
                addr: read_u24_le(&data, 0x1B),
                words: read_u16_le(&data, 0x1E),
            },
        };
        if header.resource_table as usize > data.len() {
            return Err(RomError::BadResourceTable {
                offset: header.resource_table as usize,
                len: data.len(),
            });
        }

        Ok(Self { data, key, header })
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn model(&self) -> Model {
        if self.data.len() > 4 << 20 {
            Model::Tp560
        } else {
            Model::Tp550
        }
    }

    /// First byte of the erase/program-capable tail.
    pub fn save_region_start(&self) -> usize {
        self.data.len() - SAVE_REGION_SIZE
    }

    pub fn header(&self) -> &RomHeader {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// XOR a save-region buffer with the obfuscation key. Applying it
    /// twice is the identity.
    pub fn xor_save(buf: &mut [u8], key: u8) {
        if key != 0 {
            for b in buf {
                *b ^= key;
            }
        }
    }
}

pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

pub fn read_u24_le(data: &[u8], offset: usize) -> u32 {
    data[offset] as u32 | (data[offset + 1] as u32) << 8 | (data[offset + 2] as u32) << 16
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_rom() -> Vec<u8> {
        let mut data = vec![0u8; MIN_ROM_SIZE];
        data[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(MAGIC);
        data
    }

    #[test]
    fn plain_rom_has_zero_key() {
        let rom = RomImage::from_bytes(blank_rom()).unwrap();
        assert_eq!(rom.key(), 0);
        assert_eq!(&rom.bytes()[MAGIC_OFFSET..MAGIC_OFFSET + 4], MAGIC);
    }

    #[test]
    fn obfuscated_rom_decodes() {
        let mut data = blank_rom();
        data[5] = 0x12;
        for b in &mut data {
            *b ^= 0x5A;
        }
        let rom = RomImage::from_bytes(data).unwrap();
        assert_eq!(rom.key(), 0x5A);
        // Whole image comes out in the clear.
        assert_eq!(&rom.bytes()[MAGIC_OFFSET..MAGIC_OFFSET + 4], MAGIC);
        assert_eq!(rom.bytes()[5], 0x12);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut data = blank_rom();
        data[MAGIC_OFFSET + 1] ^= 0xFF;
        assert!(matches!(
            RomImage::from_bytes(data),
            Err(RomError::BadMagic(_))
        ));
    }

    #[test]
    fn short_rom_rejected() {
        let data = vec![0u8; 0x1000];
        assert!(matches!(
            RomImage::from_bytes(data),
            Err(RomError::TooSmall(_))
        ));
    }

    #[test]
    fn oversized_rom_rejected() {
        let data = vec![0u8; MAX_ROM_SIZE + 1];
        assert!(matches!(
            RomImage::from_bytes(data),
            Err(RomError::TooLarge(_))
        ));
    }

    #[test]
    fn resource_table_bounds_checked() {
        let mut data = blank_rom();
        // 24-bit pointer way past the end of a 64 KiB image.
        data[0] = 0xFF;
        data[1] = 0xFF;
        data[2] = 0x7F;
        assert!(matches!(
            RomImage::from_bytes(data),
            Err(RomError::BadResourceTable { .. })
        ));
    }

    #[test]
    fn model_by_size() {
        let rom = RomImage::from_bytes(blank_rom()).unwrap();
        assert_eq!(rom.model(), Model::Tp550);

        let mut big = vec![0u8; 8 << 20];
        big[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(MAGIC);
        let rom = RomImage::from_bytes(big).unwrap();
        assert_eq!(rom.model(), Model::Tp560);
        assert_eq!(rom.model().screen_height(), 160);
    }

    #[test]
    fn xor_save_is_involution() {
        let mut buf: Vec<u8> = (0u16..256).map(|v| v as u8).collect();
        let orig = buf.clone();
        RomImage::xor_save(&mut buf, 0x77);
        assert_ne!(buf, orig);
        RomImage::xor_save(&mut buf, 0x77);
        assert_eq!(buf, orig);
    }

    #[test]
    fn save_region_is_rom_tail() {
        let rom = RomImage::from_bytes(blank_rom()).unwrap();
        assert_eq!(rom.save_region_start() + SAVE_REGION_SIZE, rom.len());
    }
}
