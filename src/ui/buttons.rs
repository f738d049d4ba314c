//! GPIO button input.
//!
//! Three physical buttons (active-low with internal pull-up):
//!   - A - clear the console
//!   - B - toggle duty cycling
//!   - C - hard reset
//!
//! The control loop samples the raw levels every tick; release detection
//! and the hold threshold live in [`crate::ui::input_logic`].

use embassy_nrf::gpio::{AnyPin, Input, Pull};

use crate::ui::input_logic::BUTTON_COUNT;

pub struct Buttons {
    pins: [Input<'static>; BUTTON_COUNT],
}

impl Buttons {
    pub fn new(a: AnyPin, b: AnyPin, c: AnyPin) -> Self {
        Self {
            pins: [
                Input::new(a, Pull::Up),
                Input::new(b, Pull::Up),
                Input::new(c, Pull::Up),
            ],
        }
    }

    /// `true` for each button currently held down, in A, B, C order.
    pub fn levels(&self) -> [bool; BUTTON_COUNT] {
        core::array::from_fn(|i| self.pins[i].is_low())
    }
}
