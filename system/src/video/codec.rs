//! RLE image decoding straight into the framebuffer.
//!
//! An image resource is a 4-byte header `[W, 0, H, 0x80]` followed by one
//! run-encoded scanline per row. Each scanline carries its own 16-bit
//! length (covering the length field and two trailing bytes), so clipped
//! rows can be skipped without decoding.

use crate::error::RuntimeError;
use crate::rom::RomImage;
use crate::video::{FrameBuffer, SCREEN_WIDTH};

/// Read and validate the image header at `offs`, returning (W, H).
pub fn image_size(rom: &RomImage, offs: usize) -> Result<(u8, u8), RuntimeError> {
    let data = rom.bytes();
    if offs + 4 > data.len() {
        return Err(RuntimeError::BadImageHeader { offset: offs });
    }
    if data[offs + 1] != 0x00 || data[offs + 3] != 0x80 {
        return Err(RuntimeError::BadImageHeader { offset: offs });
    }
    Ok((data[offs], data[offs + 2]))
}

/// Blit the image at ROM offset `offs` to `(x, y)`.
///
/// `flip` bit 0 mirrors horizontally, bit 1 vertically. `alpha >= 0`
/// names the color-key value to skip (the firmware uses 0); `alpha == -1`
/// draws opaque. With `blend != 0xff` every written pixel is half-summed
/// with `blend` per 3-3-2 channel.
pub fn draw_image(
    fb: &mut FrameBuffer,
    rom: &RomImage,
    x: i32,
    y: i32,
    offs: usize,
    flip: u8,
    blend: u8,
    alpha: i16,
) -> Result<(), RuntimeError> {
    let (w, h) = image_size(rom, offs)?;
    if flip > 3 {
        return Err(RuntimeError::BadFlip(flip));
    }
    let (w, h) = (w as i32, h as i32);
    let data = rom.bytes();
    let screen_h = fb.height() as i32;
    let visible = x + w > 0 && x < SCREEN_WIDTH as i32 && y + h > 0 && y < screen_h;

    let mut p = offs + 4;
    for row in 0..h {
        if p + 2 > data.len() {
            return Err(RuntimeError::Rle { offset: p });
        }
        let len = u16::from_le_bytes([data[p], data[p + 1]]) as usize;
        let row_end = p + len;
        if len < 4 || row_end > data.len() {
            return Err(RuntimeError::Rle { offset: p });
        }

        let dy = if flip & 2 != 0 { y + h - 1 - row } else { y + row };
        if visible && (0..screen_h).contains(&dy) {
            decode_row(
                fb,
                &data[p + 2..row_end - 2],
                w,
                x,
                dy as usize,
                flip,
                blend,
                alpha,
            )
            .map_err(|()| RuntimeError::Rle { offset: p })?;
        }
        p = row_end;
    }
    Ok(())
}

/// Walk one scanline's runs left to right in source order, writing each
/// on-screen pixel to its flip-adjusted destination column.
#[allow(clippy::too_many_arguments)]
fn decode_row(
    fb: &mut FrameBuffer,
    rle: &[u8],
    w: i32,
    x: i32,
    dy: usize,
    flip: u8,
    blend: u8,
    alpha: i16,
) -> Result<(), ()> {
    let mut q = 0;
    let mut col = 0;
    while col < w {
        if q >= rle.len() {
            return Err(());
        }
        let b = rle[q];
        q += 1;
        let (val, count) = if b != 0 {
            (b, 1)
        } else {
            if q + 2 > rle.len() {
                return Err(());
            }
            let (v, n) = (rle[q], rle[q + 1]);
            q += 2;
            if n == 0 {
                return Err(());
            }
            (v, n as usize)
        };
        for _ in 0..count {
            if col >= w {
                return Err(());
            }
            let dx = if flip & 1 != 0 { x + w - 1 - col } else { x + col };
            if (0..SCREEN_WIDTH as i32).contains(&dx) && (alpha < 0 || val != alpha as u8) {
                let out = if blend != 0xFF {
                    blend_index(val, blend)
                } else {
                    val
                };
                fb.set(dx as usize, dy, out);
            }
            col += 1;
        }
    }
    Ok(())
}

/// Half-sum two packed 3-3-2 indices per channel. Red and blue share one
/// add, green the other; the fractional bit of each average bleeds into
/// the neighboring channel, faithful to the device blitter.
#[inline]
fn blend_index(src: u8, blend: u8) -> u8 {
    let rb = ((src & 0xE3) as u16 + (blend & 0xE3) as u16) >> 1;
    let g = ((src & 0x1C) as u16 + (blend & 0x1C) as u16) >> 1;
    (rb | g) as u8
}

/// Sprite-overlap test on the 8-bit coordinate ring.
///
/// An axis overlaps when either directional distance is inside the other
/// sprite's extent; both axes must overlap. The merged direction bits
/// above bit 1 are kept for parity with the device BIOS but never tested.
pub fn check_intersect(
    rom: &RomImage,
    x1: u8,
    y1: u8,
    offs1: usize,
    x2: u8,
    y2: u8,
    offs2: usize,
) -> Result<bool, RuntimeError> {
    let (w1, h1) = image_size(rom, offs1)?;
    let (w2, h2) = image_size(rom, offs2)?;
    let mut cmp = 0u8;
    if x2.wrapping_sub(x1) < w1 {
        cmp |= 1;
    }
    if y2.wrapping_sub(y1) < h1 {
        cmp |= 2;
    }
    if x1.wrapping_sub(x2) < w2 {
        cmp |= 1 | 4;
    }
    if y1.wrapping_sub(y2) < h2 {
        cmp |= 2 | 8;
    }
    Ok(cmp & 3 == 3)
}

/// Flood a column or row span from a one-pixel-wide or one-pixel-tall
/// source image.
pub fn repeat_line(
    fb: &mut FrameBuffer,
    rom: &RomImage,
    start: u8,
    end: u8,
    offs: usize,
) -> Result<(), RuntimeError> {
    let (w, h) = image_size(rom, offs)?;
    if w == 1 {
        draw_image(fb, rom, start as i32, 0, offs, 0, 0xFF, -1)?;
        let col = start as usize;
        if col >= SCREEN_WIDTH {
            return Ok(());
        }
        let last = (end as usize).min(SCREEN_WIDTH - 1);
        let rows = (h as usize).min(fb.height());
        for y in 0..rows {
            let v = fb.get(col, y);
            for x in col..=last {
                fb.set(x, y, v);
            }
        }
    } else if h == 1 {
        draw_image(fb, rom, 0, start as i32, offs, 0, 0xFF, -1)?;
        let row = start as usize;
        if row >= fb.height() {
            return Ok(());
        }
        let last = (end as usize).min(fb.height() - 1);
        for y in row + 1..=last {
            fb.pixels_mut()
                .copy_within(row * SCREEN_WIDTH..(row + 1) * SCREEN_WIDTH, y * SCREEN_WIDTH);
        }
    } else {
        return Err(RuntimeError::BadRepeatShape { w, h });
    }
    Ok(())
}
