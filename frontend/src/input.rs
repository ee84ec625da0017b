use std::collections::HashMap;

use sdl2::keyboard::Scancode;
use toumapet_core::core::machine::InputButton;

/// Maps SDL scancodes to console button IDs.
pub struct KeyMap {
    map: HashMap<Scancode, u8>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a console button ID.
    pub fn bind(&mut self, scancode: Scancode, button_id: u8) {
        self.map.insert(scancode, button_id);
    }

    /// Look up the console button ID for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u8> {
        self.map.get(&scancode).copied()
    }
}

/// Default bindings for the console's buttons. Each front/side button
/// gets a letter key plus the matching navigation key.
pub fn default_key_map(buttons: &[InputButton]) -> KeyMap {
    let mut km = KeyMap::new();

    for button in buttons {
        let scancodes: &[Scancode] = match button.name {
            "Left" => &[Scancode::A, Scancode::Left],
            "Middle" => &[Scancode::S, Scancode::Down],
            "Right" => &[Scancode::D, Scancode::Right],
            "Side Left" => &[Scancode::Q, Scancode::Delete],
            "Side Right" => &[Scancode::E, Scancode::PageDown],
            "Reset" => &[Scancode::R],
            _ => &[],
        };

        for &sc in scancodes {
            km.bind(sc, button.id);
        }
    }

    km
}
