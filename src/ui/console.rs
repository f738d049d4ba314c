//! On-screen debug console.
//!
//! A bounded scroll-back of short text lines. Messages above the
//! configured [`DebugLevel`] are dropped, long lines are cut at the
//! column limit, and the oldest line goes when the console is full.
//! The display task redraws whenever [`Console::take_dirty`] says so.

use core::fmt::Write;

use heapless::{Deque, String};

use crate::config::DebugLevel;

/// A single console row.
pub type Line<const COLS: usize> = String<COLS>;

#[derive(Clone)]
pub struct Console<const LINES: usize, const COLS: usize> {
    level: DebugLevel,
    lines: Deque<Line<COLS>, LINES>,
    dirty: bool,
}

impl<const LINES: usize, const COLS: usize> Console<LINES, COLS> {
    pub const fn new(level: DebugLevel) -> Self {
        Self {
            level,
            lines: Deque::new(),
            dirty: false,
        }
    }

    /// Whether a message at `level` would be shown.
    pub fn enabled(&self, level: DebugLevel) -> bool {
        level != DebugLevel::Off && level <= self.level
    }

    /// Append `text` if `level` is enabled.
    pub fn log(&mut self, level: DebugLevel, text: &str) {
        if !self.enabled(level) {
            return;
        }
        let mut line = Line::new();
        for c in text.chars() {
            if line.push(c).is_err() {
                break;
            }
        }
        self.push_line(line);
    }

    /// Formatted variant of [`log`](Self::log); overflow is truncated.
    pub fn log_fmt(&mut self, level: DebugLevel, args: core::fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let mut line = Truncating(Line::new());
        let _ = line.write_fmt(args);
        self.push_line(line.0);
    }

    /// Drop every line (button A).
    pub fn clear(&mut self) {
        self.lines.clear();
        self.dirty = true;
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `true` once after each change.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    fn push_line(&mut self, line: Line<COLS>) {
        if self.lines.is_full() {
            self.lines.pop_front();
        }
        let _ = self.lines.push_back(line);
        self.dirty = true;
    }
}

/// Writer that keeps what fits and silently drops the rest.
struct Truncating<const N: usize>(String<N>);

impl<const N: usize> Write for Truncating<N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_messages_above_level() {
        let mut console: Console<4, 21> = Console::new(DebugLevel::Light);
        console.log(DebugLevel::Light, "boot");
        console.log(DebugLevel::Verbose, "value 12");
        assert_eq!(console.lines().collect::<std::vec::Vec<_>>(), ["boot"]);
    }

    #[test]
    fn off_shows_nothing() {
        let mut console: Console<4, 21> = Console::new(DebugLevel::Off);
        console.log(DebugLevel::Light, "boot");
        console.log(DebugLevel::Off, "never");
        assert!(console.is_empty());
        assert!(!console.take_dirty());
    }

    #[test]
    fn evicts_oldest_and_truncates() {
        let mut console: Console<2, 8> = Console::new(DebugLevel::Verbose);
        console.log(DebugLevel::Light, "one");
        console.log(DebugLevel::Light, "two");
        console.log_fmt(DebugLevel::Verbose, format_args!("three {}", 12345));
        let lines: std::vec::Vec<_> = console.lines().collect();
        assert_eq!(lines, ["two", "three 12"]);
    }

    #[test]
    fn clear_marks_dirty() {
        let mut console: Console<2, 8> = Console::new(DebugLevel::Light);
        console.log(DebugLevel::Light, "x");
        assert!(console.take_dirty());
        assert!(!console.take_dirty());
        console.clear();
        assert!(console.is_empty());
        assert!(console.take_dirty());
    }
}
