// Re-export state types
pub mod state;
pub use state::W65C02State;

// WDC 65C02 CPU
pub mod w65c02;
pub use w65c02::{Step, StatusFlag, UndefinedOpcode, W65C02};
