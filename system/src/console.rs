//! The TouMaPet console: CPU memory, MMIO surface, and frame scheduler.

use std::time::Instant;

use toumapet_core::core::Bus;
use toumapet_core::core::machine::{InputButton, InputEvent, InputSource};
use toumapet_core::cpu::{Step, W65C02, W65C02State};
use toumapet_core::device::SpiFlash;

use crate::bios::{self, FrameStack};
use crate::error::{RuntimeError, SaveError};
use crate::rom::{Model, RomImage, SAVE_REGION_SIZE};
use crate::video::{FrameBuffer, SCREEN_WIDTH, palette};

/// Device frame rate in Hz.
pub const FRAME_RATE: u32 = 30;

/// Bit layout of the key/flag word. The five front buttons occupy bits
/// 2..=6 with a model-dependent assignment.
pub mod keys {
    /// Host asked to quit (Esc or window close).
    pub const QUIT: u32 = 1 << 16;
    /// Soft-reset requested.
    pub const RESET: u32 = 1 << 17;
    /// Firmware powered the device off through port 0.
    pub const POWER_OFF: u32 = 1 << 18;
    /// Last interpreter run ended on WAI.
    pub const WAI_IDLE: u32 = 1 << 19;
    /// Screen-blank requested; the scheduler clears the framebuffer.
    pub const BLANKED: u32 = 1 << 20;
}

/// Logical button ids, independent of the per-model bit assignment.
pub mod buttons {
    pub const LEFT: u8 = 0;
    pub const MIDDLE: u8 = 1;
    pub const RIGHT: u8 = 2;
    pub const SIDE_LEFT: u8 = 3;
    pub const SIDE_RIGHT: u8 = 4;
    pub const RESET: u8 = 5;
    pub const QUIT: u8 = 6;
}

const INPUT_MAP: &[InputButton] = &[
    InputButton { id: buttons::LEFT, name: "Left" },
    InputButton { id: buttons::MIDDLE, name: "Middle" },
    InputButton { id: buttons::RIGHT, name: "Right" },
    InputButton { id: buttons::SIDE_LEFT, name: "Side Left" },
    InputButton { id: buttons::SIDE_RIGHT, name: "Side Right" },
    InputButton { id: buttons::RESET, name: "Reset" },
    InputButton { id: buttons::QUIT, name: "Quit" },
];

/// Key-word bit for a front button on the given model.
fn button_bit(model: Model, button: u8) -> Option<u32> {
    let bit = match (model, button) {
        (Model::Tp550, buttons::LEFT) => 4,
        (Model::Tp550, buttons::MIDDLE) => 5,
        (Model::Tp550, buttons::RIGHT) => 6,
        (Model::Tp550, buttons::SIDE_LEFT) => 3,
        (Model::Tp550, buttons::SIDE_RIGHT) => 2,
        (Model::Tp560, buttons::LEFT) => 2,
        (Model::Tp560, buttons::MIDDLE) => 3,
        (Model::Tp560, buttons::RIGHT) => 4,
        (Model::Tp560, buttons::SIDE_LEFT) => 5,
        (Model::Tp560, buttons::SIDE_RIGHT) => 6,
        _ => return None,
    };
    Some(1 << bit)
}

/// Why the interpreter handed control back to the scheduler.
#[derive(Copy, Clone, Debug, PartialEq)]
enum ExitReason {
    /// The entry frame returned through the trampoline.
    FrameDone,
    /// WAI: idle until the next scheduler tick.
    Wai,
    /// Firmware wrote 0 to port 0.
    PowerOff,
}

/// Everything on the far side of the CPU bus. Split from the CPU so that
/// stepping borrows the two disjointly.
pub(crate) struct Hardware {
    pub(crate) mem: Box<[u8; 0x10000]>,
    pub(crate) rom: RomImage,
    pub(crate) fb: FrameBuffer,
    pub(crate) frames: FrameStack,
    pub(crate) flash: SpiFlash,
    pub(crate) keys: u32,
    model: Model,
    /// Counts port-0 reads; every 16th drains the host event pump.
    input_timer: u8,
    exit: Option<ExitReason>,
    fatal: Option<RuntimeError>,
}

impl Hardware {
    fn pump(&mut self, input: &mut dyn InputSource) {
        for event in input.poll() {
            self.apply_input(event);
        }
    }

    fn apply_input(&mut self, event: InputEvent) {
        match event.button {
            buttons::RESET => {
                if event.pressed {
                    self.keys |= keys::RESET;
                }
            }
            buttons::QUIT => {
                if event.pressed {
                    self.keys |= keys::QUIT;
                }
            }
            button => {
                if let Some(mask) = button_bit(self.model, button) {
                    if event.pressed {
                        self.keys |= mask;
                    } else {
                        self.keys &= !mask;
                    }
                }
            }
        }
    }

    /// Zero-page data read with port side effects.
    fn mmio_read(&mut self, port: u8, input: &mut dyn InputSource) -> u8 {
        match port {
            0x00 => {
                self.input_timer += 1;
                if self.input_timer == 16 {
                    self.input_timer = 0;
                    self.pump(input);
                }
                // Buttons are active-low from the firmware's side.
                !self.keys as u8
            }
            0x02 => {
                // Flash busy indicator self-clears.
                self.mem[0x02] &= !0x02;
                self.mem[0x02]
            }
            0x14 => {
                // Timer-ready latch.
                self.mem[0x14] |= 0x40;
                self.mem[0x14]
            }
            0x7B => {
                self.mem[0x7B] |= 0x08;
                self.mem[0x7B]
            }
            0x93 => {
                self.mem[0x93] |= 0x80;
                self.mem[0x93]
            }
            port => self.mem[port as usize],
        }
    }

    /// Zero-page data write with port side effects.
    fn mmio_write(&mut self, port: u8, data: u8) {
        match port {
            0x00 if data == 0 => {
                self.keys |= keys::POWER_OFF | keys::BLANKED;
                self.exit = Some(ExitReason::PowerOff);
            }
            0x02 => {
                let save_offs = self.rom.save_region_start();
                let key = self.rom.key();
                if let Err(e) = self
                    .flash
                    .write_data(data, self.rom.bytes_mut(), save_offs, key)
                {
                    self.fatal = Some(e.into());
                }
                self.mem[0x02] = data;
            }
            0x12 => {
                self.flash.chip_select(data);
                self.mem[0x12] = data;
            }
            port => self.mem[port as usize] = data,
        }
    }
}

/// The CPU's view of the hardware for the duration of one instruction.
struct SysBus<'a> {
    hw: &'a mut Hardware,
    input: &'a mut dyn InputSource,
}

impl Bus for SysBus<'_> {
    fn fetch(&mut self, addr: u16) -> u8 {
        self.hw.mem[addr as usize]
    }

    fn read(&mut self, addr: u16) -> u8 {
        if addr < 0x100 {
            self.hw.mmio_read(addr as u8, self.input)
        } else {
            self.hw.mem[addr as usize]
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x00FF => self.hw.mmio_write(addr as u8, data),
            // LCD display-off command.
            0x8000 if data == 0x28 => {
                self.hw.keys |= keys::BLANKED;
                self.hw.mem[addr as usize] = data;
            }
            _ => self.hw.mem[addr as usize] = data,
        }
    }
}

/// TouMaPet 550/560 virtual-pet handheld.
///
/// Hardware: WDC 65C02, 128-wide color LCD (128 or 160 rows by model),
/// five buttons, SPI flash holding both firmware and saves.
pub struct ToumaPetSystem {
    cpu: W65C02,
    hw: Hardware,
    palette: [[u8; 3]; 256],
    booted: bool,
    epoch: Instant,
    /// Milliseconds already folded into the 1/256 s tick counter.
    last_ms: u64,
}

impl ToumaPetSystem {
    pub fn new(rom: RomImage) -> Self {
        let model = rom.model();
        let mut hw = Hardware {
            mem: vec![0u8; 0x10000].into_boxed_slice().try_into().unwrap(),
            rom,
            fb: FrameBuffer::new(model.screen_height()),
            frames: FrameStack::new(),
            flash: SpiFlash::new(),
            keys: 0,
            model,
            input_timer: 0,
            exit: None,
            fatal: None,
        };
        hw.mem[bios::SYS_RTS_PAD as usize] = 0x60;
        Self {
            cpu: W65C02::new(),
            hw,
            palette: palette::build_palette(),
            booted: false,
            epoch: Instant::now(),
            last_ms: 0,
        }
    }

    pub fn display_size(&self) -> (u32, u32) {
        (SCREEN_WIDTH as u32, self.hw.fb.height() as u32)
    }

    pub fn model(&self) -> Model {
        self.hw.model
    }

    pub fn keys(&self) -> u32 {
        self.hw.keys
    }

    pub fn input_map(&self) -> &'static [InputButton] {
        INPUT_MAP
    }

    pub fn cpu_state(&self) -> W65C02State {
        self.cpu.snapshot()
    }

    pub fn memory(&self) -> &[u8] {
        &self.hw.mem[..]
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.hw.mem[..]
    }

    pub fn rom(&self) -> &RomImage {
        &self.hw.rom
    }

    pub fn framebuffer(&self) -> &[u8] {
        self.hw.fb.pixels()
    }

    pub fn frame_depth(&self) -> usize {
        self.hw.frames.depth()
    }

    /// Expand the framebuffer into an RGB24 buffer of at least
    /// `width * height * 3` bytes.
    pub fn render_frame(&self, out: &mut [u8]) {
        palette::render_rgb24(&self.hw.fb, &self.palette, out);
    }

    /// Latch one input event outside the event pump.
    pub fn set_input(&mut self, button: u8, pressed: bool) {
        self.hw.apply_input(InputEvent { button, pressed });
    }

    /// Boot the console. Runs the cold-start frame to completion unless a
    /// save image already hydrated memory.
    pub fn power_on(&mut self, input: &mut dyn InputSource) -> Result<(), RuntimeError> {
        if self.booted {
            return Ok(());
        }
        self.booted = true;
        self.cold_start(input)
    }

    fn cold_start(&mut self, input: &mut dyn InputSource) -> Result<(), RuntimeError> {
        self.hw.mem[0xA3] |= 0x01; // start animation
        self.hw.mem[0x99] = self.hw.rom.key();
        self.hw.mem[bios::SYS_RTS_PAD as usize] = 0x60;
        let boot = self.hw.rom.header().boot;
        bios::enter_frame(&mut self.cpu, &mut self.hw, boot.addr, boot.words, true)?;
        self.run_interpreter(input)?;
        Ok(())
    }

    /// Soft reset: wipe CPU state, clear the button bits, cold-start.
    pub fn reset(&mut self, input: &mut dyn InputSource) -> Result<(), RuntimeError> {
        self.hw.keys &= !0xFF;
        self.hw.keys &= !(keys::RESET | keys::WAI_IDLE | keys::BLANKED);
        self.cpu.reset();
        self.hw.mem.fill(0);
        self.hw.fb.fill(0);
        self.hw.frames.clear();
        self.hw.flash.reset();
        self.hw.input_timer = 0;
        self.hw.exit = None;
        self.cold_start(input)
    }

    /// One scheduler step: timers, the periodic entry frame, and an
    /// interpreter run. Presentation and pacing belong to the caller.
    pub fn run_frame(&mut self, input: &mut dyn InputSource) -> Result<(), RuntimeError> {
        self.hw.pump(input);

        // 16-bit idle timer, saturating at zero.
        let idle = u16::from_le_bytes([self.hw.mem[0x181], self.hw.mem[0x182]]);
        if idle > 0 {
            let [lo, hi] = (idle - 1).to_le_bytes();
            self.hw.mem[0x181] = lo;
            self.hw.mem[0x182] = hi;
        }

        // Fold wall-clock time into the 1/256 s counter, carrying the
        // accounted-for milliseconds so no fraction is lost.
        let now = self.epoch.elapsed().as_millis() as u64;
        let ticks = (now - self.last_ms) * 256 / 1000;
        if ticks > 0 {
            self.hw.mem[0xAF] = self.hw.mem[0xAF].wrapping_add(ticks as u8);
            self.last_ms += ticks * 1000 / 256;
        }

        // A frame parked on WAI resumes where it stopped instead of
        // getting a fresh entry push.
        let was_idle = self.hw.keys & keys::WAI_IDLE != 0;
        self.hw.keys &= !keys::WAI_IDLE;
        if !was_idle {
            self.hw.mem[0x93] |= 0x10;
            let tick = self.hw.rom.header().tick;
            bios::enter_frame(&mut self.cpu, &mut self.hw, tick.addr, tick.words, true)?;
        }
        self.run_interpreter(input)?;

        if self.hw.keys & keys::BLANKED != 0 {
            self.hw.fb.fill(0);
            self.hw.keys &= !keys::BLANKED;
        }
        Ok(())
    }

    /// Execute until the entry frame returns, the firmware idles on WAI,
    /// or a power-off write lands.
    fn run_interpreter(&mut self, input: &mut dyn InputSource) -> Result<ExitReason, RuntimeError> {
        loop {
            if let Some(fatal) = self.hw.fatal.take() {
                return Err(fatal);
            }
            if let Some(exit) = self.hw.exit.take() {
                return Ok(exit);
            }
            match self.cpu.pc {
                bios::SYS_DISPATCH => bios::dispatch(&mut self.cpu, &mut self.hw)?,
                bios::SYS_ROM_READ => bios::rom_read6(&mut self.cpu, &mut self.hw),
                bios::SYS_TAIL_CALL => bios::rom_call(&mut self.cpu, &mut self.hw, true)?,
                bios::SYS_ROM_CALL => bios::rom_call(&mut self.cpu, &mut self.hw, false)?,
                bios::SYS_RETURN => {
                    if bios::frame_return(&mut self.cpu, &mut self.hw)? {
                        return Ok(ExitReason::FrameDone);
                    }
                }
                _ => {
                    let mut bus = SysBus {
                        hw: &mut self.hw,
                        input,
                    };
                    match self.cpu.step(&mut bus)? {
                        Step::Normal => {}
                        Step::Wai => {
                            self.hw.keys |= keys::WAI_IDLE;
                            return Ok(ExitReason::Wai);
                        }
                    }
                }
            }
        }
    }

    /// Serialize the session: CPU memory, the save region re-obfuscated
    /// to the on-flash form, and the framebuffer.
    pub fn save_state(&self) -> Vec<u8> {
        let save_offs = self.hw.rom.save_region_start();
        let mut out =
            Vec::with_capacity(0x10000 + SAVE_REGION_SIZE + self.hw.fb.pixels().len());
        out.extend_from_slice(&self.hw.mem[..]);
        let tail_start = out.len();
        out.extend_from_slice(&self.hw.rom.bytes()[save_offs..]);
        RomImage::xor_save(&mut out[tail_start..], self.hw.rom.key());
        out.extend_from_slice(self.hw.fb.pixels());
        out
    }

    /// Hydrate a session from a save image. Sizes must match exactly.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), SaveError> {
        let fb_len = self.hw.fb.pixels().len();
        let expected = 0x10000 + SAVE_REGION_SIZE + fb_len;
        if data.len() != expected {
            return Err(SaveError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.hw.mem.copy_from_slice(&data[..0x10000]);
        let key = self.hw.rom.key();
        let save_offs = self.hw.rom.save_region_start();
        let tail = &mut self.hw.rom.bytes_mut()[save_offs..];
        tail.copy_from_slice(&data[0x10000..0x10000 + SAVE_REGION_SIZE]);
        RomImage::xor_save(tail, key);
        self.hw.fb.load(&data[0x10000 + SAVE_REGION_SIZE..]);
        self.booted = true;
        Ok(())
    }

    /// Copy a wall-clock date into device RAM (seconds stored doubled).
    pub fn set_wall_clock(&mut self, year: u8, mon: u8, mday: u8, hour: u8, min: u8, sec: u8) {
        let fields = [year, mon, mday, hour, min, sec.wrapping_mul(2)];
        self.hw.mem[0x1DF..0x1E5].copy_from_slice(&fields);
    }
}
