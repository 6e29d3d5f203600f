#![forbid(unsafe_code)]

//! Keyboard event model and propagation flow.
//!
//! Events are plain values; delivery is handled by
//! [`Document::dispatch_key`](crate::Document::dispatch_key), which threads an
//! [`EventFlow`] through every listener on the propagation path. A listener
//! can suppress the document's built-in reaction (`prevent_default`) or stop
//! the event from reaching ancestor listeners (`stop_propagation`); the two
//! are independent, matching the usual browser contract.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const CONTROL = 0b0000_0010;
        const ALT = 0b0000_0100;
        const META = 0b0000_1000;
    }
}

/// Key identity for a keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    Tab,
    Enter,
    Escape,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Press/release phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Press,
    Release,
}

/// A keyboard event delivered to document key listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key event.
    pub const fn new(code: KeyCode, modifiers: Modifiers, kind: KeyEventKind) -> Self {
        Self {
            code,
            modifiers,
            kind,
        }
    }

    /// A plain key press with no modifiers.
    pub const fn press(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty(), KeyEventKind::Press)
    }

    /// A key press with Shift held.
    pub const fn shift_press(code: KeyCode) -> Self {
        Self::new(code, Modifiers::SHIFT, KeyEventKind::Press)
    }

    /// Whether this is a Tab press (with or without Shift).
    pub fn is_tab_press(&self) -> bool {
        self.code == KeyCode::Tab && self.kind == KeyEventKind::Press
    }

    /// Whether Shift is held.
    pub fn shifted(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Mutable propagation state threaded through a dispatch.
///
/// Starts fully permissive; listeners flip the flags. Once set, a flag stays
/// set for the remainder of the dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlow {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl EventFlow {
    /// Suppress the document's built-in reaction to this event
    /// (e.g. native Tab traversal).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stop the event from reaching listeners on ancestor nodes.
    /// Listeners on the current node still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether the built-in reaction was suppressed.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether upward propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_helper_has_no_modifiers() {
        let ev = KeyEvent::press(KeyCode::Tab);
        assert_eq!(ev.modifiers, Modifiers::empty());
        assert_eq!(ev.kind, KeyEventKind::Press);
        assert!(ev.is_tab_press());
        assert!(!ev.shifted());
    }

    #[test]
    fn shift_press_sets_shift() {
        let ev = KeyEvent::shift_press(KeyCode::Tab);
        assert!(ev.shifted());
        assert!(ev.is_tab_press());
    }

    #[test]
    fn tab_release_is_not_a_tab_press() {
        let ev = KeyEvent::new(KeyCode::Tab, Modifiers::empty(), KeyEventKind::Release);
        assert!(!ev.is_tab_press());
    }

    #[test]
    fn flow_flags_are_independent() {
        let mut flow = EventFlow::default();
        assert!(!flow.default_prevented());
        assert!(!flow.propagation_stopped());

        flow.prevent_default();
        assert!(flow.default_prevented());
        assert!(!flow.propagation_stopped());

        flow.stop_propagation();
        assert!(flow.propagation_stopped());
    }
}
