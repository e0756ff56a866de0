//! Computer keyboard to note mapping
//!
//! A single static table maps each physical key to its `(note, channel)`
//! pair, so the note lookup and the channel lookup can never drift apart.
//! Two key regions exist:
//!
//! ```text
//!  Upper rows -> channel 1, notes 48-67:
//!    2   3       5   6   7       9   0       =
//!   Q   W   E   R   T   Y   U   I   O   P   [   ]
//!
//!  Lower rows -> channel 0, notes 35-52:
//!    S   D       G   H   J       L   ;
//!  \  Z   X   C   V   B   N   M   ,   .   /
//! ```
//!
//! Keys are identified by their US-layout character; unmapped keys produce
//! no event.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use notewire_proto::MidiEvent;

/// Velocity carried by every keyboard-synthesized note on
pub const KEY_VELOCITY: u8 = 127;

/// Default auto-release timeout in milliseconds
/// Must be longer than the OS key repeat delay (typically 300-500ms)
pub const DEFAULT_NOTE_RELEASE_MS: u64 = 400;

/// One key of the virtual keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// The US-layout character identifying the physical key (lowercase)
    pub key: char,
    /// MIDI note number (0-127)
    pub note: u8,
    /// MIDI channel the key plays on (0 or 1)
    pub channel: u8,
}

const fn bind(key: char, note: u8, channel: u8) -> KeyBinding {
    KeyBinding { key, note, channel }
}

/// The full key table. Fixed at compile time, never mutated.
pub static BINDINGS: [KeyBinding; 38] = [
    // Lower rows: channel 0, notes 35-52
    bind('\\', 35, 0),
    bind('z', 36, 0),
    bind('s', 37, 0),
    bind('x', 38, 0),
    bind('d', 39, 0),
    bind('c', 40, 0),
    bind('v', 41, 0),
    bind('g', 42, 0),
    bind('b', 43, 0),
    bind('h', 44, 0),
    bind('n', 45, 0),
    bind('j', 46, 0),
    bind('m', 47, 0),
    bind(',', 48, 0),
    bind('l', 49, 0),
    bind('.', 50, 0),
    bind(';', 51, 0),
    bind('/', 52, 0),
    // Upper rows: channel 1, notes 48-67
    bind('q', 48, 1),
    bind('2', 49, 1),
    bind('w', 50, 1),
    bind('3', 51, 1),
    bind('e', 52, 1),
    bind('r', 53, 1),
    bind('5', 54, 1),
    bind('t', 55, 1),
    bind('6', 56, 1),
    bind('y', 57, 1),
    bind('7', 58, 1),
    bind('u', 59, 1),
    bind('i', 60, 1),
    bind('9', 61, 1),
    bind('o', 62, 1),
    bind('0', 63, 1),
    bind('p', 64, 1),
    bind('[', 65, 1),
    bind('=', 66, 1),
    bind(']', 67, 1),
];

/// Look up the binding for a key character (case-insensitive).
/// Returns `None` for keys outside the table.
pub fn binding_for(key: char) -> Option<&'static KeyBinding> {
    let key = key.to_ascii_lowercase();
    BINDINGS.iter().find(|b| b.key == key)
}

/// Virtual keyboard state: which keys are held, and when they were last
/// touched (for auto-release on terminals without key-up reporting).
#[derive(Debug, Clone)]
pub struct Keyboard {
    /// Currently held keys with their last-touch timestamps
    held: HashMap<char, Instant>,
    /// How long an untouched key stays held before auto-release
    release_duration: Duration,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_NOTE_RELEASE_MS))
    }
}

impl Keyboard {
    /// Create a keyboard with the given auto-release timeout
    pub fn new(release_duration: Duration) -> Self {
        Self {
            held: HashMap::new(),
            release_duration,
        }
    }

    /// Handle a key press.
    ///
    /// Returns the note on to synthesize, or `None` for unmapped keys and
    /// for keys already held (auto-repeat presses refresh the timestamp
    /// but produce no event).
    pub fn key_down(&mut self, key: char) -> Option<MidiEvent> {
        let binding = binding_for(key)?;
        let now = Instant::now();
        if self.held.insert(binding.key, now).is_some() {
            return None;
        }
        Some(MidiEvent::NoteOn {
            channel: binding.channel,
            note: binding.note,
            velocity: KEY_VELOCITY,
        })
    }

    /// Refresh a held key's timestamp without producing an event
    /// (call on key repeat notifications)
    pub fn touch(&mut self, key: char) {
        if let Some(binding) = binding_for(key) {
            if let Some(timestamp) = self.held.get_mut(&binding.key) {
                *timestamp = Instant::now();
            }
        }
    }

    /// Handle a key release.
    ///
    /// Returns the note off to synthesize, or `None` for unmapped keys
    /// and keys that were not held.
    pub fn key_up(&mut self, key: char) -> Option<MidiEvent> {
        let binding = binding_for(key)?;
        self.held.remove(&binding.key)?;
        Some(MidiEvent::NoteOff {
            channel: binding.channel,
            note: binding.note,
        })
    }

    /// Release keys not touched within the release timeout.
    /// Used when no real key-up events are available.
    pub fn release_expired(&mut self) -> Vec<MidiEvent> {
        let now = Instant::now();
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, &timestamp)| now.duration_since(timestamp) > self.release_duration)
            .map(|(&key, _)| key)
            .collect();

        expired.into_iter().filter_map(|key| self.key_up(key)).collect()
    }

    /// Release every held key (focus loss, shutdown)
    pub fn release_all(&mut self) -> Vec<MidiEvent> {
        let held: Vec<char> = self.held.keys().copied().collect();
        held.into_iter().filter_map(|key| self.key_up(key)).collect()
    }

    /// Whether the key is currently held (for rendering)
    pub fn is_held(&self, key: char) -> bool {
        self.held.contains_key(&key.to_ascii_lowercase())
    }

    /// Number of currently held keys
    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_well_formed() {
        let keys: HashSet<char> = BINDINGS.iter().map(|b| b.key).collect();
        assert_eq!(keys.len(), BINDINGS.len(), "duplicate key in table");

        for b in &BINDINGS {
            match b.channel {
                0 => assert!((35..=52).contains(&b.note), "bad lower note {}", b.note),
                1 => assert!((48..=67).contains(&b.note), "bad upper note {}", b.note),
                ch => panic!("unexpected channel {}", ch),
            }
        }
    }

    #[test]
    fn test_binding_lookup() {
        let b = binding_for('i').unwrap();
        assert_eq!((b.note, b.channel), (60, 1));

        let b = binding_for('z').unwrap();
        assert_eq!((b.note, b.channel), (36, 0));

        // Case-insensitive
        assert_eq!(binding_for('I'), binding_for('i'));

        // Outside the table
        assert_eq!(binding_for('a'), None);
        assert_eq!(binding_for('8'), None);
        assert_eq!(binding_for(' '), None);
    }

    #[test]
    fn test_key_down_up() {
        let mut keyboard = Keyboard::default();

        let event = keyboard.key_down('i').unwrap();
        assert_eq!(event, MidiEvent::NoteOn { channel: 1, note: 60, velocity: 127 });
        assert!(keyboard.is_held('i'));

        let event = keyboard.key_up('i').unwrap();
        assert_eq!(event, MidiEvent::NoteOff { channel: 1, note: 60 });
        assert!(!keyboard.is_held('i'));
    }

    #[test]
    fn test_repeat_press_produces_no_event() {
        let mut keyboard = Keyboard::default();

        assert!(keyboard.key_down('i').is_some());
        // Held key pressed again (auto-repeat): no event
        assert!(keyboard.key_down('i').is_none());
        assert_eq!(keyboard.held_count(), 1);
    }

    #[test]
    fn test_unmapped_key_produces_no_event() {
        let mut keyboard = Keyboard::default();
        assert!(keyboard.key_down('a').is_none());
        assert!(keyboard.key_up('a').is_none());
        assert_eq!(keyboard.held_count(), 0);
    }

    #[test]
    fn test_release_without_press_produces_no_event() {
        let mut keyboard = Keyboard::default();
        assert!(keyboard.key_up('i').is_none());
    }

    #[test]
    fn test_auto_release() {
        let mut keyboard = Keyboard::new(Duration::from_millis(1));
        keyboard.key_down('i');
        keyboard.key_down('z');

        std::thread::sleep(Duration::from_millis(5));
        let mut released = keyboard.release_expired();
        released.sort_by_key(|e| e.channel());

        assert_eq!(
            released,
            vec![
                MidiEvent::NoteOff { channel: 0, note: 36 },
                MidiEvent::NoteOff { channel: 1, note: 60 },
            ]
        );
        assert_eq!(keyboard.held_count(), 0);
    }

    #[test]
    fn test_touch_refreshes_timestamp() {
        let mut keyboard = Keyboard::new(Duration::from_millis(50));
        keyboard.key_down('i');

        std::thread::sleep(Duration::from_millis(30));
        keyboard.touch('i');
        std::thread::sleep(Duration::from_millis(30));

        // 60ms since press but only 30ms since touch
        assert!(keyboard.release_expired().is_empty());
        assert!(keyboard.is_held('i'));
    }

    #[test]
    fn test_release_all() {
        let mut keyboard = Keyboard::default();
        keyboard.key_down('i');
        keyboard.key_down('o');
        keyboard.key_down('z');

        let released = keyboard.release_all();
        assert_eq!(released.len(), 3);
        assert_eq!(keyboard.held_count(), 0);
        assert!(released.iter().all(|e| matches!(e, MidiEvent::NoteOff { .. })));
    }
}
