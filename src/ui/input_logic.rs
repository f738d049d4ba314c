//! Button-to-command mapping.
//!
//! Polled once per control-loop tick with the raw (already active-high)
//! button levels. A button fires on release, and only if it was held for
//! at least the configured threshold; at most one command per button per
//! tick.

use heapless::Vec;

/// Physical buttons, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    A,
    B,
    C,
}

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [Button::A, Button::B, Button::C];

    /// Command bound to this button.
    pub fn command(self) -> Command {
        match self {
            Button::A => Command::ClearDisplay,
            Button::B => Command::ToggleDutyCycle,
            Button::C => Command::HardReset,
        }
    }
}

/// Number of buttons on the node.
pub const BUTTON_COUNT: usize = 3;

/// Discrete actions the control loop carries out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Wipe the console and home the cursor.
    ClearDisplay,
    /// Flip duty cycling (also extends the awake window).
    ToggleDutyCycle,
    /// Restart from scratch; the retained state is dropped.
    HardReset,
}

/// Edge detector for "released after holding at least `hold_ms`".
#[derive(Clone, Copy, Debug)]
pub struct ReleaseDetector {
    hold_ms: u64,
    pressed_since: Option<u64>,
}

impl ReleaseDetector {
    pub const fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            pressed_since: None,
        }
    }

    /// Feed the current level; `true` on a qualifying release.
    pub fn update(&mut self, pressed: bool, now_ms: u64) -> bool {
        match (pressed, self.pressed_since) {
            (true, None) => {
                self.pressed_since = Some(now_ms);
                false
            }
            (false, Some(since)) => {
                self.pressed_since = None;
                now_ms.saturating_sub(since) >= self.hold_ms
            }
            _ => false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_since.is_some()
    }
}

/// Turns per-tick button levels into commands.
pub struct InputDispatcher {
    detectors: [ReleaseDetector; BUTTON_COUNT],
}

impl InputDispatcher {
    pub const fn new(hold_ms: u64) -> Self {
        Self {
            detectors: [ReleaseDetector::new(hold_ms); BUTTON_COUNT],
        }
    }

    /// `levels[i]` is `true` while [`Button::ALL`]`[i]` is held.
    pub fn poll(
        &mut self,
        levels: [bool; BUTTON_COUNT],
        now_ms: u64,
    ) -> Vec<Command, BUTTON_COUNT> {
        let mut commands = Vec::new();
        for ((detector, &pressed), button) in self
            .detectors
            .iter_mut()
            .zip(levels.iter())
            .zip(Button::ALL)
        {
            if detector.update(pressed, now_ms) {
                trace!("Input: {} released", button);
                // Capacity equals the button count, so this cannot fail.
                let _ = commands.push(button.command());
            }
        }
        commands
    }
}
