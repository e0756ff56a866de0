//! The 3-byte frame codec
//!
//! Frames travel back-to-back with no delimiter; the receiver relies on
//! fixed 3-byte alignment and cannot resynchronize if a byte is lost on
//! the transport. Every byte placement here is load-bearing: a wrong bit
//! silently becomes a different note, channel, or bend value on the
//! receiving device.

use crate::error::{Error, Result};
use crate::event::MidiEvent;

/// Every frame is exactly this many bytes
pub const FRAME_LEN: usize = 3;

/// Marker bit: set on every status byte, never on payload bytes
const STATUS_MARKER: u8 = 0x80;

/// Message-type tags, placed in bits 6-4 of the status byte.
/// Tags 2, 4, 5 and 7 are unassigned.
const TAG_NOTE_OFF: u8 = 0;
const TAG_NOTE_ON: u8 = 1;
const TAG_CONTROL_CHANGE: u8 = 3;
const TAG_PITCH_BEND: u8 = 6;

/// Velocity byte carried by every note off frame. The receiver firmware
/// expects 127 here; any off-velocity the sender had is discarded.
const NOTE_OFF_VELOCITY: u8 = 127;

/// One encoded frame: exactly 3 bytes, immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFrame([u8; FRAME_LEN]);

impl WireFrame {
    /// Encode an event into its frame.
    ///
    /// Deterministic and total for in-range input. Out-of-range fields
    /// are rejected with [`Error::InvalidEvent`] instead of being
    /// truncated into a different, valid-looking frame.
    pub fn encode(event: &MidiEvent) -> Result<WireFrame> {
        let channel = check("channel", event.channel() as u16, 15)? as u8;

        let bytes = match *event {
            MidiEvent::NoteOff { note, .. } => {
                let note = check("note", note as u16, 127)? as u8;
                [status(TAG_NOTE_OFF, channel), note, NOTE_OFF_VELOCITY]
            }
            MidiEvent::NoteOn { note, velocity, .. } => {
                let note = check("note", note as u16, 127)? as u8;
                let velocity = check("velocity", velocity as u16, 127)? as u8;
                [status(TAG_NOTE_ON, channel), note, velocity]
            }
            MidiEvent::ControlChange { controller, value, .. } => {
                let controller = check("controller", controller as u16, 127)? as u8;
                let value = check("value", value as u16, 127)? as u8;
                [status(TAG_CONTROL_CHANGE, channel), controller, value]
            }
            MidiEvent::PitchBend { value, .. } => {
                let value = check("value", value, 16383)?;
                // 14-bit split: low 7 bits first, high 7 bits second
                [
                    status(TAG_PITCH_BEND, channel),
                    (value & 0x7F) as u8,
                    (value >> 7) as u8,
                ]
            }
        };

        Ok(WireFrame(bytes))
    }

    /// Decode a frame back into its event.
    ///
    /// This is the receiver's view of the protocol, used by tests and by
    /// anything that wants to mirror the firmware. Rejects status bytes
    /// without the marker bit or with an unassigned tag, and payload
    /// bytes with bit 7 set.
    pub fn decode(&self) -> Result<MidiEvent> {
        let [status, b1, b2] = self.0;

        if status & STATUS_MARKER == 0 {
            return Err(Error::InvalidStatus(status));
        }
        for byte in [b1, b2] {
            if byte & 0x80 != 0 {
                return Err(Error::InvalidPayload(byte));
            }
        }

        let tag = (status >> 4) & 0x07;
        let channel = status & 0x0F;

        match tag {
            TAG_NOTE_OFF => Ok(MidiEvent::NoteOff { channel, note: b1 }),
            TAG_NOTE_ON => Ok(MidiEvent::NoteOn { channel, note: b1, velocity: b2 }),
            TAG_CONTROL_CHANGE => Ok(MidiEvent::ControlChange {
                channel,
                controller: b1,
                value: b2,
            }),
            TAG_PITCH_BEND => Ok(MidiEvent::PitchBend {
                channel,
                value: (b1 as u16) | ((b2 as u16) << 7),
            }),
            _ => Err(Error::InvalidStatus(status)),
        }
    }

    /// Wrap raw bytes received off the wire, for decoding
    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> WireFrame {
        WireFrame(bytes)
    }

    /// The raw frame bytes
    pub fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for WireFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl MidiEvent {
    /// Shorthand for [`WireFrame::encode`]
    pub fn encode(&self) -> Result<WireFrame> {
        WireFrame::encode(self)
    }
}

/// Build a status byte: marker bit, tag in bits 6-4, channel in bits 3-0
fn status(tag: u8, channel: u8) -> u8 {
    STATUS_MARKER | (tag << 4) | channel
}

/// Range check for an event field
fn check(field: &'static str, value: u16, max: u16) -> Result<u16> {
    if value > max {
        Err(Error::InvalidEvent { field, value, max })
    } else {
        Ok(value)
    }
}
