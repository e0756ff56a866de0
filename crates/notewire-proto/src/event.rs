//! The event model and the raw-MIDI inbound boundary
//!
//! Exactly four message kinds cross the bridge. Everything else a MIDI
//! device can emit (program change, aftertouch, sysex, clock, ...) is
//! dropped at the parse boundary and never reaches the wire.

/// A musical event accepted by the wire codec.
///
/// Field ranges are a caller contract: `channel` is 4-bit (0-15), `note`,
/// `velocity`, `controller` and `value` are 7-bit (0-127) except for the
/// pitch bend value which is 14-bit (0-16383, center 8192). Events built
/// by [`MidiEvent::from_bytes`] always satisfy the contract; hand-built
/// events are checked by the codec at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Note on (channel 0-15, note 0-127, velocity 0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note off (channel 0-15, note 0-127). Off-velocity is never
    /// represented; the wire always carries 127.
    NoteOff { channel: u8, note: u8 },
    /// Pitch bend (channel 0-15, unsigned 14-bit value, center 8192)
    PitchBend { channel: u8, value: u16 },
    /// Control change (channel 0-15, controller 0-127, value 0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiEvent {
    /// Parse raw MIDI bytes into an event.
    ///
    /// Returns `None` for messages the bridge does not carry: program
    /// change (0xC), aftertouch (0xA/0xD), and all system messages (0xF).
    /// A note on with velocity 0 stays a note on; the receiver firmware
    /// gets the bytes the device sent.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        let status = bytes[0];
        let channel = status & 0x0F;

        match status & 0xF0 {
            0x90 if bytes.len() >= 3 => Some(MidiEvent::NoteOn {
                channel,
                note: bytes[1] & 0x7F,
                velocity: bytes[2] & 0x7F,
            }),
            0x80 if bytes.len() >= 3 => Some(MidiEvent::NoteOff {
                channel,
                note: bytes[1] & 0x7F,
            }),
            0xB0 if bytes.len() >= 3 => Some(MidiEvent::ControlChange {
                channel,
                controller: bytes[1] & 0x7F,
                value: bytes[2] & 0x7F,
            }),
            0xE0 if bytes.len() >= 3 => {
                // 14-bit value: LSB first, then MSB
                let lsb = (bytes[1] & 0x7F) as u16;
                let msb = (bytes[2] & 0x7F) as u16;
                Some(MidiEvent::PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                })
            }
            _ => None,
        }
    }

    /// The MIDI channel this event belongs to
    pub fn channel(&self) -> u8 {
        match self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ControlChange { channel, .. } => *channel,
        }
    }
}

impl std::fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MidiEvent::NoteOn { channel, note, velocity } => {
                write!(f, "Note on - ch={} note={} vel={}", channel, note, velocity)
            }
            MidiEvent::NoteOff { channel, note } => {
                write!(f, "Note off - ch={} note={}", channel, note)
            }
            MidiEvent::PitchBend { channel, value } => {
                write!(f, "Pitch bend - ch={} value={}", channel, value)
            }
            MidiEvent::ControlChange { channel, controller, value } => {
                write!(f, "CC - ch={} cc={} value={}", channel, controller, value)
            }
        }
    }
}
