pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::Bus;
    pub use crate::core::machine::{InputButton, InputEvent, InputSource};
    pub use crate::cpu::W65C02;
    pub use crate::device::spi_flash::SpiFlash;
}
