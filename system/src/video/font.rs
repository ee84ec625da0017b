//! 8x16 1-bpp glyph blit from the ROM font table.

use crate::error::RuntimeError;
use crate::rom::RomImage;
use crate::video::{FrameBuffer, SCREEN_WIDTH};

/// Draw one glyph at `(x, y)`. Each glyph is 16 row bytes, MSB leftmost,
/// starting at the header font base and indexed from code 0x20. With
/// `bg >= 0` clear pixels are painted in `bg`; with `bg == -1` they are
/// left alone.
pub fn draw_char(
    fb: &mut FrameBuffer,
    rom: &RomImage,
    x: i32,
    y: i32,
    code: u8,
    fg: u8,
    bg: i16,
) -> Result<(), RuntimeError> {
    if code < 0x20 {
        return Err(RuntimeError::BadGlyph(code));
    }
    let base = rom.header().font as usize + (code as usize - 0x20) * 16;
    let data = rom.bytes();
    if base + 16 > data.len() {
        return Err(RuntimeError::RomRead {
            offset: base,
            len: 16,
        });
    }

    let screen_h = fb.height() as i32;
    for (row, &bits) in data[base..base + 16].iter().enumerate() {
        let py = y + row as i32;
        if !(0..screen_h).contains(&py) {
            continue;
        }
        for col in 0..8u8 {
            let px = x + col as i32;
            if !(0..SCREEN_WIDTH as i32).contains(&px) {
                continue;
            }
            if bits & (0x80 >> col) != 0 {
                fb.set(px as usize, py as usize, fg);
            } else if bg >= 0 {
                fb.set(px as usize, py as usize, bg as u8);
            }
        }
    }
    Ok(())
}
