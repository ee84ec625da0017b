use super::{Operand, W65C02};
use crate::core::Bus;

impl W65C02 {
    /// Fetch the data operand. Memory operands go through `Bus::read`,
    /// so zero-page I/O side effects fire here and only here.
    #[inline]
    pub(crate) fn load<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Imm(v) => v,
            Operand::Addr(addr) => bus.read(addr),
            Operand::Acc => self.a,
            _ => 0,
        }
    }

    /// Store to the resolved address. No data read happens for stores.
    #[inline]
    pub(crate) fn store<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand, data: u8) {
        if let Operand::Addr(addr) = operand {
            bus.write(addr, data);
        }
    }

    /// Read-modify-write on memory or the accumulator.
    #[inline]
    pub(crate) fn rmw<B, F>(&mut self, bus: &mut B, operand: Operand, op: F)
    where
        B: Bus + ?Sized,
        F: FnOnce(&mut Self, u8) -> u8,
    {
        match operand {
            Operand::Acc => {
                let a = self.a;
                let result = op(self, a);
                self.a = result;
            }
            Operand::Addr(addr) => {
                let v = bus.read(addr);
                let result = op(self, v);
                bus.write(addr, result);
            }
            _ => {}
        }
    }
}
