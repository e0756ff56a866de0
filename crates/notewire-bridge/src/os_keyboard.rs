//! OS-level keyboard input using rdev
//!
//! This module provides reliable key press and release detection by
//! intercepting keyboard events at the OS level, bypassing terminal
//! limitations. When it is unavailable the bridge falls back to terminal
//! key events plus the auto-release timer.

use crossbeam_channel::{unbounded, Receiver, Sender};
use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Keyboard events from the OS-level listener
#[derive(Debug, Clone)]
pub enum OsKeyEvent {
    /// A key was pressed (repeats included; the keyboard state
    /// suppresses them)
    Press(char),
    /// A key was released
    Release(char),
}

/// OS-level keyboard listener that captures key press and release events
pub struct OsKeyboardListener {
    /// Channel receiver for keyboard events
    event_rx: Receiver<OsKeyEvent>,
    /// Shutdown flag
    shutdown: Arc<AtomicBool>,
    /// Listener thread handle
    _thread: JoinHandle<()>,
}

impl OsKeyboardListener {
    /// Start the OS keyboard listener
    ///
    /// Returns None if the listener couldn't be started (e.g., on systems
    /// without X11)
    pub fn new() -> Option<Self> {
        if !is_available() {
            return None;
        }

        let (tx, rx) = unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = thread::spawn(move || {
            run_listener(tx, shutdown_clone);
        });

        // Give the thread a moment to start
        thread::sleep(std::time::Duration::from_millis(100));

        Some(Self {
            event_rx: rx,
            shutdown,
            _thread: thread,
        })
    }

    /// Try to receive a keyboard event (non-blocking)
    pub fn try_recv(&self) -> Option<OsKeyEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Drop for OsKeyboardListener {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Map an rdev key to the US-layout character identifying it in the
/// binding table.
///
/// rdev reports physical key positions; the table covers the two note
/// rows plus the punctuation keys at their edges. `IntlBackslash` is the
/// extra key next to the left shift on ISO keyboards, the lowest note of
/// the lower row.
pub fn key_to_char(key: Key) -> Option<char> {
    match key {
        // Lower row (channel 0)
        Key::IntlBackslash | Key::BackSlash => Some('\\'),
        Key::KeyZ => Some('z'),
        Key::KeyS => Some('s'),
        Key::KeyX => Some('x'),
        Key::KeyD => Some('d'),
        Key::KeyC => Some('c'),
        Key::KeyV => Some('v'),
        Key::KeyG => Some('g'),
        Key::KeyB => Some('b'),
        Key::KeyH => Some('h'),
        Key::KeyN => Some('n'),
        Key::KeyJ => Some('j'),
        Key::KeyM => Some('m'),
        Key::Comma => Some(','),
        Key::KeyL => Some('l'),
        Key::Dot => Some('.'),
        Key::SemiColon => Some(';'),
        Key::Slash => Some('/'),

        // Upper rows (channel 1)
        Key::KeyQ => Some('q'),
        Key::Num2 => Some('2'),
        Key::KeyW => Some('w'),
        Key::Num3 => Some('3'),
        Key::KeyE => Some('e'),
        Key::KeyR => Some('r'),
        Key::Num5 => Some('5'),
        Key::KeyT => Some('t'),
        Key::Num6 => Some('6'),
        Key::KeyY => Some('y'),
        Key::Num7 => Some('7'),
        Key::KeyU => Some('u'),
        Key::KeyI => Some('i'),
        Key::Num9 => Some('9'),
        Key::KeyO => Some('o'),
        Key::Num0 => Some('0'),
        Key::KeyP => Some('p'),
        Key::LeftBracket => Some('['),
        Key::Equal => Some('='),
        Key::RightBracket => Some(']'),

        // Control keys
        Key::Escape => Some('\x1b'),

        _ => None,
    }
}

/// Run the rdev listener (blocking - runs in its own thread)
fn run_listener(tx: Sender<OsKeyEvent>, shutdown: Arc<AtomicBool>) {
    let callback = move |event: Event| {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        match event.event_type {
            EventType::KeyPress(key) => {
                if let Some(c) = key_to_char(key) {
                    let _ = tx.send(OsKeyEvent::Press(c));
                }
            }
            EventType::KeyRelease(key) => {
                if let Some(c) = key_to_char(key) {
                    let _ = tx.send(OsKeyEvent::Release(c));
                }
            }
            _ => {}
        }
    };

    // This blocks until an error occurs
    if let Err(e) = listen(callback) {
        log::error!("OS keyboard listener error: {:?}", e);
    }
}

/// Check if the OS keyboard listener is likely to work on this system
pub fn is_available() -> bool {
    // On Linux, rdev requires X11 or Wayland
    #[cfg(target_os = "linux")]
    {
        std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
    }

    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::binding_for;

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_to_char(Key::KeyI), Some('i'));
        assert_eq!(key_to_char(Key::IntlBackslash), Some('\\'));
        assert_eq!(key_to_char(Key::SemiColon), Some(';'));
        assert_eq!(key_to_char(Key::Equal), Some('='));
        assert_eq!(key_to_char(Key::Num8), None); // not a note key
        assert_eq!(key_to_char(Key::Space), None);
    }

    #[test]
    fn test_mapped_keys_cover_binding_table() {
        // Every char the OS listener can emit for a note key must have
        // a binding, and vice versa
        let note_keys = [
            Key::IntlBackslash, Key::KeyZ, Key::KeyS, Key::KeyX, Key::KeyD,
            Key::KeyC, Key::KeyV, Key::KeyG, Key::KeyB, Key::KeyH, Key::KeyN,
            Key::KeyJ, Key::KeyM, Key::Comma, Key::KeyL, Key::Dot,
            Key::SemiColon, Key::Slash, Key::KeyQ, Key::Num2, Key::KeyW,
            Key::Num3, Key::KeyE, Key::KeyR, Key::Num5, Key::KeyT, Key::Num6,
            Key::KeyY, Key::Num7, Key::KeyU, Key::KeyI, Key::Num9, Key::KeyO,
            Key::Num0, Key::KeyP, Key::LeftBracket, Key::Equal, Key::RightBracket,
        ];
        assert_eq!(note_keys.len(), crate::keyboard::BINDINGS.len());
        for key in note_keys {
            let c = key_to_char(key).unwrap();
            assert!(binding_for(c).is_some(), "no binding for {:?}", key);
        }
    }
}
