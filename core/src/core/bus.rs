/// Memory interface seen by a CPU core.
///
/// The 16-bit address space is split between plain memory and memory-mapped
/// I/O by the implementor. Instruction bytes and indirect pointers go
/// through [`fetch`](Bus::fetch), which must never trigger I/O side
/// effects; only the data access at a resolved effective address uses
/// [`read`](Bus::read)/[`write`](Bus::write). Store instructions perform no
/// data read at all, so read-side I/O effects are suppressed for them by
/// construction.
pub trait Bus {
    /// Instruction or pointer fetch. No I/O side effects.
    fn fetch(&mut self, addr: u16) -> u8;

    /// Data read at an effective address. May trigger I/O.
    fn read(&mut self, addr: u16) -> u8;

    /// Data write at an effective address. May trigger I/O.
    fn write(&mut self, addr: u16, data: u8);
}
