pub mod spi_flash;

pub use spi_flash::{FlashError, SpiFlash};
