/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed back in [`InputEvent`]s.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "Left", "Enter").
    pub name: &'static str,
}

/// A latched button transition delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub button: u8,
    pub pressed: bool,
}

/// Host-side event source polled by the machine.
///
/// The machine drains this at frame boundaries and opportunistically from
/// inside the emulated input port, so a held key reaches the firmware
/// without waiting for the next frame. Implementations translate host
/// events (keyboard, window close) into machine button IDs.
pub trait InputSource {
    /// Drain all pending host events.
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// An input source with no events, for tests and headless runs.
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }
}
