//! notewire-proto - Wire protocol for the notewire serial bridge
//!
//! Encodes four kinds of MIDI events (note on, note off, pitch bend, control
//! change) into fixed 3-byte frames for a microcontroller on the other end of
//! a serial line. The frames carry no delimiter, checksum, or length prefix;
//! the receiver relies purely on 3-byte alignment.
//!
//! Status byte layout (byte 0):
//!
//! ```text
//! bit 7    : always 1 (marks a status byte, value >= 128)
//! bits 6-4 : message-type tag (0 = note off, 1 = note on,
//!            3 = control change, 6 = pitch bend)
//! bits 3-0 : MIDI channel (0-15)
//! ```
//!
//! # Example
//!
//! ```
//! use notewire_proto::{MidiEvent, WireFrame};
//!
//! let event = MidiEvent::NoteOn { channel: 0, note: 60, velocity: 100 };
//! let frame = WireFrame::encode(&event).unwrap();
//! assert_eq!(frame.bytes(), &[144, 60, 100]);
//! assert_eq!(frame.decode().unwrap(), event);
//! ```

pub mod error;
pub mod event;
pub mod wire;

// Re-export main types
pub use error::{Error, Result};
pub use event::MidiEvent;
pub use wire::{WireFrame, FRAME_LEN};
