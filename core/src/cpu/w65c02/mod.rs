mod alu;
mod branch;
mod load_store;
mod shift;
mod stack;

use crate::core::Bus;
use crate::cpu::state::W65C02State;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// How an instruction run ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    /// Instruction retired normally.
    Normal,
    /// WAI executed; the CPU idles until the host resumes it.
    Wai,
}

/// Opcode with no defined 65C02 behavior in this machine.
///
/// Covers true holes in the opcode map plus BRK and STP, which the
/// firmware never executes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UndefinedOpcode {
    pub pc: u16,
    pub opcode: u8,
}

impl std::fmt::Display for UndefinedOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "undefined opcode 0x{:02X} at PC 0x{:04X}",
            self.opcode, self.pc
        )
    }
}

impl std::error::Error for UndefinedOpcode {}

/// Addressing modes. `ZpRel` is the composite zero-page + relative mode
/// used only by BBR/BBS. `Bad` marks holes in the opcode map.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Mode {
    Imp,
    Acc,
    Imm,
    Zp,
    ZpX,
    ZpY,
    ZpInd,
    ZpIndX,
    ZpIndY,
    Abs,
    AbsX,
    AbsY,
    AbsInd,
    AbsIndX,
    Rel,
    ZpRel,
    Bad,
}

use Mode::*;

/// Addressing mode for every opcode, indexed by the opcode byte.
#[rustfmt::skip]
const MODES: [Mode; 256] = [
    //  x0      x1      x2     x3   x4   x5   x6   x7   x8   x9    xA   xB   xC       xD    xE    xF
    Bad,    ZpIndX, Bad,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Acc, Bad, Abs,     Abs,  Abs,  ZpRel, // 0x
    Rel,    ZpIndY, ZpInd,  Bad, Zp,  ZpX, ZpX, Zp,  Imp, AbsY, Acc, Bad, Abs,     AbsX, AbsX, ZpRel, // 1x
    Abs,    ZpIndX, Bad,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Acc, Bad, Abs,     Abs,  Abs,  ZpRel, // 2x
    Rel,    ZpIndY, ZpInd,  Bad, ZpX, ZpX, ZpX, Zp,  Imp, AbsY, Acc, Bad, AbsX,    AbsX, AbsX, ZpRel, // 3x
    Imp,    ZpIndX, Bad,    Bad, Bad, Zp,  Zp,  Zp,  Imp, Imm,  Acc, Bad, Abs,     Abs,  Abs,  ZpRel, // 4x
    Rel,    ZpIndY, ZpInd,  Bad, Bad, ZpX, ZpX, Zp,  Imp, AbsY, Imp, Bad, Bad,     AbsX, AbsX, ZpRel, // 5x
    Imp,    ZpIndX, Bad,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Acc, Bad, AbsInd,  Abs,  Abs,  ZpRel, // 6x
    Rel,    ZpIndY, ZpInd,  Bad, ZpX, ZpX, ZpX, Zp,  Imp, AbsY, Imp, Bad, AbsIndX, AbsX, AbsX, ZpRel, // 7x
    Rel,    ZpIndX, Bad,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Imp, Bad, Abs,     Abs,  Abs,  ZpRel, // 8x
    Rel,    ZpIndY, ZpInd,  Bad, ZpX, ZpX, ZpY, Zp,  Imp, AbsY, Imp, Bad, Abs,     AbsX, AbsX, ZpRel, // 9x
    Imm,    ZpIndX, Imm,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Imp, Bad, Abs,     Abs,  Abs,  ZpRel, // Ax
    Rel,    ZpIndY, ZpInd,  Bad, ZpX, ZpX, ZpY, Zp,  Imp, AbsY, Imp, Bad, AbsX,    AbsX, AbsY, ZpRel, // Bx
    Imm,    ZpIndX, Bad,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Imp, Imp, Abs,     Abs,  Abs,  ZpRel, // Cx
    Rel,    ZpIndY, ZpInd,  Bad, Bad, ZpX, ZpX, Zp,  Imp, AbsY, Imp, Bad, Bad,     AbsX, AbsX, ZpRel, // Dx
    Imm,    ZpIndX, Bad,    Bad, Zp,  Zp,  Zp,  Zp,  Imp, Imm,  Imp, Bad, Abs,     Abs,  Abs,  ZpRel, // Ex
    Rel,    ZpIndY, ZpInd,  Bad, Bad, ZpX, ZpX, Zp,  Imp, AbsY, Imp, Bad, Bad,     AbsX, AbsX, ZpRel, // Fx
];

/// Resolved operand for one instruction. Addresses are computed without
/// touching the data at the effective location, so store instructions
/// never trigger read-side I/O.
#[derive(Copy, Clone)]
pub(crate) enum Operand {
    None,
    Acc,
    Imm(u8),
    Addr(u16),
    ZpRel { addr: u16, target: u16 },
}

pub struct W65C02 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,

    // Decomposed status flags, repacked only at P-register boundaries:
    // z == 0 means Z set, the sign bit of n/v is N/V, c >= 0x100 means C.
    pub(crate) z: u8,
    pub(crate) n: i8,
    pub(crate) v: i8,
    pub(crate) c: u16,
    pub(crate) d: bool,
    pub(crate) i: bool,
}

impl Default for W65C02 {
    fn default() -> Self {
        Self::new()
    }
}

impl W65C02 {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFF,
            z: 1,
            n: 0,
            v: 0,
            c: 0,
            d: false,
            i: true, // I=1 out of reset
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Repack the decomposed flags into a P byte (U always set, B clear).
    pub fn pack_p(&self) -> u8 {
        let mut p = StatusFlag::U as u8;
        if self.c >= 0x100 {
            p |= StatusFlag::C as u8;
        }
        if self.z == 0 {
            p |= StatusFlag::Z as u8;
        }
        if self.i {
            p |= StatusFlag::I as u8;
        }
        if self.d {
            p |= StatusFlag::D as u8;
        }
        if self.v < 0 {
            p |= StatusFlag::V as u8;
        }
        if self.n < 0 {
            p |= StatusFlag::N as u8;
        }
        p
    }

    /// Scatter a P byte back into the decomposed flags.
    pub fn unpack_p(&mut self, p: u8) {
        self.c = if p & StatusFlag::C as u8 != 0 { 0x100 } else { 0 };
        self.z = (p & StatusFlag::Z as u8 == 0) as u8;
        self.i = p & StatusFlag::I as u8 != 0;
        self.d = p & StatusFlag::D as u8 != 0;
        self.v = if p & StatusFlag::V as u8 != 0 { -1 } else { 0 };
        self.n = if p & StatusFlag::N as u8 != 0 { -1 } else { 0 };
    }

    pub fn snapshot(&self) -> W65C02State {
        W65C02State {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.pack_p(),
        }
    }

    #[inline]
    fn fetch_byte<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let b = bus.fetch(self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }

    #[inline]
    fn fetch_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        hi << 8 | lo
    }

    /// Read a 16-bit pointer from zero page, wrapping within the page.
    #[inline]
    fn zp_ptr<B: Bus + ?Sized>(&mut self, bus: &mut B, ptr: u8) -> u16 {
        let lo = bus.fetch(ptr as u16) as u16;
        let hi = bus.fetch(ptr.wrapping_add(1) as u16) as u16;
        hi << 8 | lo
    }

    /// Read a 16-bit pointer from anywhere. The 65C02 carries across page
    /// boundaries here (the NMOS JMP ($xxFF) bug is fixed).
    #[inline]
    fn mem_ptr<B: Bus + ?Sized>(&mut self, bus: &mut B, ptr: u16) -> u16 {
        let lo = bus.fetch(ptr) as u16;
        let hi = bus.fetch(ptr.wrapping_add(1)) as u16;
        hi << 8 | lo
    }

    fn resolve<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: Mode) -> Operand {
        match mode {
            Imp => Operand::None,
            Acc => Operand::Acc,
            Imm => Operand::Imm(self.fetch_byte(bus)),
            Zp => Operand::Addr(self.fetch_byte(bus) as u16),
            ZpX => Operand::Addr(self.fetch_byte(bus).wrapping_add(self.x) as u16),
            ZpY => Operand::Addr(self.fetch_byte(bus).wrapping_add(self.y) as u16),
            ZpInd => {
                let ptr = self.fetch_byte(bus);
                Operand::Addr(self.zp_ptr(bus, ptr))
            }
            ZpIndX => {
                let ptr = self.fetch_byte(bus).wrapping_add(self.x);
                Operand::Addr(self.zp_ptr(bus, ptr))
            }
            ZpIndY => {
                let ptr = self.fetch_byte(bus);
                let base = self.zp_ptr(bus, ptr);
                Operand::Addr(base.wrapping_add(self.y as u16))
            }
            Abs => Operand::Addr(self.fetch_word(bus)),
            AbsX => Operand::Addr(self.fetch_word(bus).wrapping_add(self.x as u16)),
            AbsY => Operand::Addr(self.fetch_word(bus).wrapping_add(self.y as u16)),
            AbsInd => {
                let ptr = self.fetch_word(bus);
                Operand::Addr(self.mem_ptr(bus, ptr))
            }
            AbsIndX => {
                let ptr = self.fetch_word(bus).wrapping_add(self.x as u16);
                Operand::Addr(self.mem_ptr(bus, ptr))
            }
            Rel => {
                let off = self.fetch_byte(bus) as i8;
                Operand::Addr(self.pc.wrapping_add(off as u16))
            }
            ZpRel => {
                let addr = self.fetch_byte(bus) as u16;
                let off = self.fetch_byte(bus) as i8;
                Operand::ZpRel {
                    addr,
                    target: self.pc.wrapping_add(off as u16),
                }
            }
            Bad => Operand::None,
        }
    }

    /// Execute one instruction.
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<Step, UndefinedOpcode> {
        let pc0 = self.pc;
        let opcode = self.fetch_byte(bus);
        let mode = MODES[opcode as usize];
        if mode == Bad {
            self.pc = pc0;
            return Err(UndefinedOpcode { pc: pc0, opcode });
        }
        let operand = self.resolve(bus, mode);

        match opcode {
            // --- LDA ---
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 | 0xB2 => {
                let v = self.load(bus, operand);
                self.a = v;
                self.set_nz(v);
            }

            // --- LDX ---
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => {
                let v = self.load(bus, operand);
                self.x = v;
                self.set_nz(v);
            }

            // --- LDY ---
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => {
                let v = self.load(bus, operand);
                self.y = v;
                self.set_nz(v);
            }

            // --- STA / STX / STY / STZ ---
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 | 0x92 => {
                self.store(bus, operand, self.a)
            }
            0x86 | 0x96 | 0x8E => self.store(bus, operand, self.x),
            0x84 | 0x94 | 0x8C => self.store(bus, operand, self.y),
            0x64 | 0x74 | 0x9C | 0x9E => self.store(bus, operand, 0),

            // --- ADC / SBC ---
            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 | 0x72 => {
                let v = self.load(bus, operand);
                self.perform_adc(v);
            }
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 | 0xF2 => {
                let v = self.load(bus, operand);
                self.perform_sbc(v);
            }

            // --- CMP / CPX / CPY ---
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 | 0xD2 => {
                let v = self.load(bus, operand);
                self.perform_compare(self.a, v);
            }
            0xE0 | 0xE4 | 0xEC => {
                let v = self.load(bus, operand);
                self.perform_compare(self.x, v);
            }
            0xC0 | 0xC4 | 0xCC => {
                let v = self.load(bus, operand);
                self.perform_compare(self.y, v);
            }

            // --- AND / ORA / EOR ---
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 | 0x32 => {
                let v = self.load(bus, operand);
                self.perform_and(v);
            }
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 | 0x12 => {
                let v = self.load(bus, operand);
                self.perform_ora(v);
            }
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 | 0x52 => {
                let v = self.load(bus, operand);
                self.perform_eor(v);
            }

            // --- BIT ---
            0x24 | 0x2C | 0x34 | 0x3C => {
                let v = self.load(bus, operand);
                self.perform_bit(v);
            }
            0x89 => {
                // BIT #imm only sets Z
                let v = self.load(bus, operand);
                self.z = self.a & v;
            }

            // --- TSB / TRB ---
            0x04 | 0x0C => {
                if let Operand::Addr(addr) = operand {
                    let v = bus.read(addr);
                    self.z = self.a & v;
                    bus.write(addr, v | self.a);
                }
            }
            0x14 | 0x1C => {
                if let Operand::Addr(addr) = operand {
                    let v = bus.read(addr);
                    self.z = self.a & v;
                    bus.write(addr, v & !self.a);
                }
            }

            // --- Shifts / rotates ---
            0x0A | 0x06 | 0x16 | 0x0E | 0x1E => self.rmw(bus, operand, Self::perform_asl),
            0x4A | 0x46 | 0x56 | 0x4E | 0x5E => self.rmw(bus, operand, Self::perform_lsr),
            0x2A | 0x26 | 0x36 | 0x2E | 0x3E => self.rmw(bus, operand, Self::perform_rol),
            0x6A | 0x66 | 0x76 | 0x6E | 0x7E => self.rmw(bus, operand, Self::perform_ror),

            // --- INC / DEC (memory and accumulator) ---
            0x1A | 0xE6 | 0xF6 | 0xEE | 0xFE => self.rmw(bus, operand, Self::perform_inc),
            0x3A | 0xC6 | 0xD6 | 0xCE | 0xDE => self.rmw(bus, operand, Self::perform_dec),

            // --- RMB / SMB (no flags) ---
            0x07 | 0x17 | 0x27 | 0x37 | 0x47 | 0x57 | 0x67 | 0x77 => {
                let bit = opcode >> 4;
                self.rmw(bus, operand, |_, v| v & !(1 << bit));
            }
            0x87 | 0x97 | 0xA7 | 0xB7 | 0xC7 | 0xD7 | 0xE7 | 0xF7 => {
                let bit = (opcode >> 4) - 8;
                self.rmw(bus, operand, |_, v| v | 1 << bit);
            }

            // --- Flag instructions ---
            0x18 => self.c = 0,     // CLC
            0x38 => self.c = 0x100, // SEC
            0x58 => self.i = false, // CLI
            0x78 => self.i = true,  // SEI
            0xB8 => self.v = 0,     // CLV
            0xD8 => self.d = false, // CLD
            0xF8 => self.d = true,  // SED

            // --- Transfers ---
            0xAA => {
                self.x = self.a;
                self.set_nz(self.x);
            }
            0xA8 => {
                self.y = self.a;
                self.set_nz(self.y);
            }
            0x8A => {
                self.a = self.x;
                self.set_nz(self.a);
            }
            0x98 => {
                self.a = self.y;
                self.set_nz(self.a);
            }
            0xBA => {
                self.x = self.sp;
                self.set_nz(self.x);
            }
            0x9A => self.sp = self.x, // TXS does not set flags

            // --- Register increment/decrement ---
            0xE8 => {
                self.x = self.x.wrapping_add(1);
                self.set_nz(self.x);
            }
            0xC8 => {
                self.y = self.y.wrapping_add(1);
                self.set_nz(self.y);
            }
            0xCA => {
                self.x = self.x.wrapping_sub(1);
                self.set_nz(self.x);
            }
            0x88 => {
                self.y = self.y.wrapping_sub(1);
                self.set_nz(self.y);
            }

            // --- NOP ---
            0xEA => {}

            // --- Branches ---
            0x10 => self.branch_if(operand, self.n >= 0), // BPL
            0x30 => self.branch_if(operand, self.n < 0),  // BMI
            0x50 => self.branch_if(operand, self.v >= 0), // BVC
            0x70 => self.branch_if(operand, self.v < 0),  // BVS
            0x90 => self.branch_if(operand, self.c < 0x100), // BCC
            0xB0 => self.branch_if(operand, self.c >= 0x100), // BCS
            0xD0 => self.branch_if(operand, self.z != 0), // BNE
            0xF0 => self.branch_if(operand, self.z == 0), // BEQ
            0x80 => self.branch_if(operand, true),        // BRA

            // --- BBR / BBS ---
            0x0F | 0x1F | 0x2F | 0x3F | 0x4F | 0x5F | 0x6F | 0x7F => {
                let bit = opcode >> 4;
                self.branch_on_bit(bus, operand, bit, false);
            }
            0x8F | 0x9F | 0xAF | 0xBF | 0xCF | 0xDF | 0xEF | 0xFF => {
                let bit = (opcode >> 4) - 8;
                self.branch_on_bit(bus, operand, bit, true);
            }

            // --- Jumps / subroutines ---
            0x4C | 0x6C | 0x7C => {
                if let Operand::Addr(target) = operand {
                    self.pc = target;
                }
            }
            0x20 => self.op_jsr(bus, operand),
            0x60 => self.op_rts(bus),
            0x40 => self.op_rti(bus),

            // --- Stack ---
            0x48 => self.push8(bus, self.a), // PHA
            0xDA => self.push8(bus, self.x), // PHX
            0x5A => self.push8(bus, self.y), // PHY
            0x68 => {
                let v = self.pull8(bus);
                self.a = v;
                self.set_nz(v);
            }
            0xFA => {
                let v = self.pull8(bus);
                self.x = v;
                self.set_nz(v);
            }
            0x7A => {
                let v = self.pull8(bus);
                self.y = v;
                self.set_nz(v);
            }
            0x08 => {
                let p = self.pack_p() | StatusFlag::B as u8;
                self.push8(bus, p);
            }
            0x28 => {
                let p = self.pull8(bus);
                self.unpack_p(p);
            }

            // --- WAI ---
            0xCB => return Ok(Step::Wai),

            // Every remaining byte is marked Bad in the mode table.
            _ => unreachable!("opcode 0x{opcode:02X} not covered by mode table"),
        }

        Ok(Step::Normal)
    }
}
