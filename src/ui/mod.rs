//! User interface subsystem - OLED console + physical buttons.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C, showing the debug console
//! - **Buttons**: 3 tactile switches, polled by the control loop
//!   (A: clear console, B: toggle duty cycle, C: hard reset)

pub mod buttons;
pub mod console;
pub mod display;
pub mod input_logic;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{DebugLevel, CONSOLE_COLUMNS, CONSOLE_LINES};

pub use console::Console;
pub use input_logic::{Command, InputDispatcher};

pub type NodeConsole = Console<CONSOLE_LINES, CONSOLE_COLUMNS>;

/// Console shared by the control loop and the BLE task.
pub type ConsoleCell = Mutex<CriticalSectionRawMutex, RefCell<NodeConsole>>;

pub fn log(console: &ConsoleCell, level: DebugLevel, text: &str) {
    console.lock(|c| c.borrow_mut().log(level, text));
}

pub fn log_fmt(console: &ConsoleCell, level: DebugLevel, args: core::fmt::Arguments<'_>) {
    console.lock(|c| c.borrow_mut().log_fmt(level, args));
}
