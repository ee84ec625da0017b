//! Session-fatal error types.

use toumapet_core::cpu::UndefinedOpcode;
use toumapet_core::device::FlashError;

/// Unrecoverable runtime condition. Every variant means either a corrupted
/// dump, a mis-dumped image, or an emulator bug; the session cannot
/// continue past any of them.
#[derive(Debug)]
pub enum RuntimeError {
    /// CPU hit an opcode with no defined behavior.
    Cpu(UndefinedOpcode),
    /// Flash protocol or write-policy violation.
    Flash(FlashError),
    /// BIOS dispatch with an X value outside the call table.
    UnknownSyscall(u8),
    /// Resource id outside the resource table, or its offset out of ROM.
    BadResource { id: u32 },
    /// Image header bytes do not match the `[W, 0, H, 0x80]` shape.
    BadImageHeader { offset: usize },
    /// Flip selector above 3.
    BadFlip(u8),
    /// Run encoding underran, overran the row, or left the ROM.
    Rle { offset: usize },
    /// Line-repeat source that is neither one pixel wide nor one tall.
    BadRepeatShape { w: u8, h: u8 },
    /// Glyph code below the printable range.
    BadGlyph(u8),
    /// Read past the end of the ROM image.
    RomRead { offset: usize, len: usize },
    /// ROM-call overlay larger than the overlay window.
    OverlaySize(usize),
    /// ROM-call nesting beyond the frame-stack bound.
    CallDepth,
    /// Return or tail call with no live frame.
    CallUnderflow,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu(e) => write!(f, "{e}"),
            Self::Flash(e) => write!(f, "{e}"),
            Self::UnknownSyscall(x) => write!(f, "unknown BIOS call X=0x{x:02X}"),
            Self::BadResource { id } => write!(f, "resource id {id} out of range"),
            Self::BadImageHeader { offset } => {
                write!(f, "bad image header at ROM offset 0x{offset:06X}")
            }
            Self::BadFlip(flip) => write!(f, "unsupported flip mode {flip}"),
            Self::Rle { offset } => write!(f, "RLE error at ROM offset 0x{offset:06X}"),
            Self::BadRepeatShape { w, h } => {
                write!(f, "repeat-line source must be a line, got {w}x{h}")
            }
            Self::BadGlyph(code) => write!(f, "glyph code 0x{code:02X} below printable range"),
            Self::RomRead { offset, len } => {
                write!(f, "read of {len} bytes at 0x{offset:06X} leaves ROM")
            }
            Self::OverlaySize(size) => write!(f, "ROM-call size 0x{size:X} exceeds overlay window"),
            Self::CallDepth => write!(f, "ROM-call frame stack overflow"),
            Self::CallUnderflow => write!(f, "ROM-call frame stack underflow"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cpu(e) => Some(e),
            Self::Flash(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UndefinedOpcode> for RuntimeError {
    fn from(e: UndefinedOpcode) -> Self {
        Self::Cpu(e)
    }
}

impl From<FlashError> for RuntimeError {
    fn from(e: FlashError) -> Self {
        Self::Flash(e)
    }
}

/// Save-file rejection at load time.
#[derive(Debug)]
pub enum SaveError {
    SizeMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "save file: expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for SaveError {}
