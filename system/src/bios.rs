//! BIOS trampoline: reserved program-counter values serviced by the host.
//!
//! The firmware never contains code at these addresses; instead the
//! interpreter checks PC before each fetch and hands control here. Calls
//! return to the firmware through the RTS pad at 0x7001, whose single
//! instruction byte is re-seeded on every use.

use toumapet_core::cpu::W65C02;

use crate::console::Hardware;
use crate::error::RuntimeError;
use crate::resources;
use crate::rom::{read_u16_le, read_u24_le};
use crate::video::{codec, font};

pub(crate) const SYS_DISPATCH: u16 = 0x6000;
pub(crate) const SYS_ROM_READ: u16 = 0x6003;
pub(crate) const SYS_TAIL_CALL: u16 = 0x6052;
pub(crate) const SYS_ROM_CALL: u16 = 0x60DE;
pub(crate) const SYS_RETURN: u16 = 0x7000;
pub(crate) const SYS_RTS_PAD: u16 = 0x7001;

/// Overlay window for ROM-call code.
pub(crate) const OVERLAY_BASE: usize = 0x0300;
const OVERLAY_MAX: usize = 0x0500;
/// Syscall argument area.
const ARG_BASE: usize = 0x0100;
/// ROM-call argument block: u24 address then u16 word count.
const CALL_ARGS: usize = 0x0080;

pub const MAX_FRAMES: usize = 16;

/// One live ROM-call overlay.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    pub rom_addr: u32,
    pub size: u16,
}

/// Bounded LIFO of live overlays. Depth mirrors how many ROM calls are
/// outstanding; the overlay window always holds the top frame's bytes.
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(MAX_FRAMES),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    fn top(&self) -> Option<Frame> {
        self.frames.last().copied()
    }
}

/// Syscall selector carried in X for the 0x6000 dispatch.
#[derive(Copy, Clone, Debug, PartialEq)]
enum BiosCall {
    ImageSize,
    ImageDrawAlpha,
    ImageDraw,
    Clear,
    RepeatLine,
    Intersect,
    CharAlpha,
    Char,
    /// Addressable from ROM but unreversed; traces and does nothing.
    Diagnostic(u8),
}

impl TryFrom<u8> for BiosCall {
    type Error = u8;

    fn try_from(x: u8) -> Result<Self, u8> {
        Ok(match x {
            0x06 => Self::ImageSize,
            0x08 => Self::ImageDrawAlpha,
            0x0A => Self::ImageDraw,
            0x0C => Self::Clear,
            0x0E => Self::RepeatLine,
            0x10 => Self::Intersect,
            0x24 => Self::CharAlpha,
            0x26 => Self::Char,
            0x14 | 0x16 | 0x18 | 0x1A | 0x1C | 0x1E | 0x2C => Self::Diagnostic(x),
            _ => return Err(x),
        })
    }
}

fn arg_u24(mem: &[u8], i: usize) -> u32 {
    read_u24_le(mem, ARG_BASE + i)
}

/// Route PC = 0x6000 by the syscall selector in X, then return to the
/// firmware caller through the RTS pad.
pub(crate) fn dispatch(cpu: &mut W65C02, hw: &mut Hardware) -> Result<(), RuntimeError> {
    let call = BiosCall::try_from(cpu.x).map_err(RuntimeError::UnknownSyscall)?;
    match call {
        BiosCall::ImageSize => {
            let id = arg_u24(&hw.mem[..], 0);
            let offs = resources::image_offset(&hw.rom, id)?;
            let (w, h) = codec::image_size(&hw.rom, offs)?;
            hw.mem[0x85] = w;
            hw.mem[0x86] = h;
        }
        BiosCall::ImageDrawAlpha => draw_image_call(hw, 0)?,
        BiosCall::ImageDraw => draw_image_call(hw, -1)?,
        BiosCall::Clear => {
            let start = hw.mem[ARG_BASE] as usize;
            let end = hw.mem[ARG_BASE + 1] as usize;
            let color = hw.mem[ARG_BASE + 2];
            hw.fb.clear_rows(start, end, color);
        }
        BiosCall::RepeatLine => {
            let start = hw.mem[ARG_BASE];
            let end = hw.mem[ARG_BASE + 1];
            let id = arg_u24(&hw.mem[..], 2);
            let offs = resources::image_offset(&hw.rom, id)?;
            codec::repeat_line(&mut hw.fb, &hw.rom, start, end, offs)?;
        }
        BiosCall::Intersect => {
            let (x1, y1) = (hw.mem[ARG_BASE], hw.mem[ARG_BASE + 1]);
            let id1 = arg_u24(&hw.mem[..], 2);
            let (x2, y2) = (hw.mem[ARG_BASE + 6], hw.mem[ARG_BASE + 7]);
            let id2 = arg_u24(&hw.mem[..], 8);
            let offs1 = resources::image_offset(&hw.rom, id1)?;
            let offs2 = resources::image_offset(&hw.rom, id2)?;
            cpu.a = codec::check_intersect(&hw.rom, x1, y1, offs1, x2, y2, offs2)? as u8;
        }
        BiosCall::CharAlpha => {
            let x = hw.mem[ARG_BASE] as i8 as i32;
            let y = hw.mem[ARG_BASE + 1] as i8 as i32;
            let code = hw.mem[ARG_BASE + 2];
            let fg = hw.mem[ARG_BASE + 3];
            font::draw_char(&mut hw.fb, &hw.rom, x, y, code, fg, -1)?;
        }
        BiosCall::Char => {
            let x = hw.mem[ARG_BASE] as i8 as i32;
            let y = hw.mem[ARG_BASE + 1] as i8 as i32;
            let code = hw.mem[ARG_BASE + 2];
            let fg = hw.mem[ARG_BASE + 3];
            let bg = hw.mem[ARG_BASE + 4];
            font::draw_char(&mut hw.fb, &hw.rom, x, y, code, fg, bg as i16)?;
        }
        BiosCall::Diagnostic(x) => log::trace!("diagnostic syscall 0x{x:02X}"),
    }
    return_through_pad(cpu, hw);
    Ok(())
}

fn draw_image_call(hw: &mut Hardware, alpha: i16) -> Result<(), RuntimeError> {
    let x = hw.mem[ARG_BASE] as i8 as i32;
    let y = hw.mem[ARG_BASE + 1] as i8 as i32;
    let id = arg_u24(&hw.mem[..], 2);
    let flip = hw.mem[ARG_BASE + 5];
    let blend = hw.mem[ARG_BASE + 6];
    let offs = resources::image_offset(&hw.rom, id)?;
    codec::draw_image(&mut hw.fb, &hw.rom, x, y, offs, flip, blend, alpha)
}

/// PC = 0x6003: copy six ROM bytes at the u24 address in the call-args
/// block into MEM[0x8D..0x93]. Bytes past the end of the image read as
/// the erased-flash value under the obfuscation key.
pub(crate) fn rom_read6(cpu: &mut W65C02, hw: &mut Hardware) {
    let base = read_u24_le(&hw.mem[..], CALL_ARGS) as usize;
    let key = hw.rom.key();
    for i in 0..6 {
        hw.mem[0x8D + i] = hw.rom.bytes().get(base + i).copied().unwrap_or(!key);
    }
    return_through_pad(cpu, hw);
}

/// PC = 0x60DE (call) or 0x6052 (tail call): map a ROM slice into the
/// overlay window and enter it. A tail call first retires the running
/// frame and reuses its pushed return address.
pub(crate) fn rom_call(cpu: &mut W65C02, hw: &mut Hardware, tail: bool) -> Result<(), RuntimeError> {
    let addr = read_u24_le(&hw.mem[..], CALL_ARGS);
    let words = read_u16_le(&hw.mem[..], CALL_ARGS + 3);
    if tail && hw.frames.pop().is_none() {
        return Err(RuntimeError::CallUnderflow);
    }
    enter_frame(cpu, hw, addr, words, !tail)
}

/// Push a frame and start executing its overlay at 0x0300.
pub(crate) fn enter_frame(
    cpu: &mut W65C02,
    hw: &mut Hardware,
    addr: u32,
    words: u16,
    push_return: bool,
) -> Result<(), RuntimeError> {
    let size = words as usize * 2;
    if size >= OVERLAY_MAX {
        return Err(RuntimeError::OverlaySize(size));
    }
    let start = addr as usize;
    if start + size > hw.rom.len() {
        return Err(RuntimeError::RomRead {
            offset: start,
            len: size,
        });
    }
    if hw.frames.depth() >= MAX_FRAMES {
        return Err(RuntimeError::CallDepth);
    }
    if push_return {
        // RTS adds one, landing the callee's return on the 0x7000 handler.
        push16(cpu, &mut hw.mem[..], 0x6FFF);
    }
    hw.mem[OVERLAY_BASE..OVERLAY_BASE + size].copy_from_slice(&hw.rom.bytes()[start..start + size]);
    hw.frames.push(Frame {
        rom_addr: addr,
        size: size as u16,
    });
    cpu.pc = OVERLAY_BASE as u16;
    Ok(())
}

/// PC = 0x7000: retire the top frame. Returns true when the last frame
/// returned and the interpreter should yield; otherwise the caller's
/// overlay is restored from ROM and execution resumes through the pad.
pub(crate) fn frame_return(cpu: &mut W65C02, hw: &mut Hardware) -> Result<bool, RuntimeError> {
    if hw.frames.pop().is_none() {
        return Err(RuntimeError::CallUnderflow);
    }
    match hw.frames.top() {
        None => Ok(true),
        Some(frame) => {
            let start = frame.rom_addr as usize;
            let size = frame.size as usize;
            hw.mem[OVERLAY_BASE..OVERLAY_BASE + size]
                .copy_from_slice(&hw.rom.bytes()[start..start + size]);
            return_through_pad(cpu, hw);
            Ok(false)
        }
    }
}

/// Seed the RTS pad and point PC at it; the next step pops the caller's
/// return address like any other RTS.
fn return_through_pad(cpu: &mut W65C02, hw: &mut Hardware) {
    hw.mem[SYS_RTS_PAD as usize] = 0x60;
    cpu.pc = SYS_RTS_PAD;
}

fn push16(cpu: &mut W65C02, mem: &mut [u8], v: u16) {
    mem[0x0100 + cpu.sp as usize] = (v >> 8) as u8;
    cpu.sp = cpu.sp.wrapping_sub(1);
    mem[0x0100 + cpu.sp as usize] = v as u8;
    cpu.sp = cpu.sp.wrapping_sub(1);
}
