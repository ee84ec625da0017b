use super::{Operand, W65C02};
use crate::core::Bus;

impl W65C02 {
    /// Conditional relative branch. The target was resolved from the
    /// already-advanced PC, so a not-taken branch just falls through.
    #[inline]
    pub(crate) fn branch_if(&mut self, operand: Operand, condition: bool) {
        if condition && let Operand::Addr(target) = operand {
            self.pc = target;
        }
    }

    /// BBRn/BBSn: test one bit of a zero-page byte and branch on it.
    /// The zero-page access is a data read, so I/O side effects apply.
    #[inline]
    pub(crate) fn branch_on_bit<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        operand: Operand,
        bit: u8,
        branch_if_set: bool,
    ) {
        if let Operand::ZpRel { addr, target } = operand {
            let set = bus.read(addr) & (1 << bit) != 0;
            if set == branch_if_set {
                self.pc = target;
            }
        }
    }
}
