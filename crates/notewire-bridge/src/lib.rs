//! notewire-bridge - MIDI + computer keyboard to serial bridge
//!
//! Bridges two event sources into one outbound serial byte stream consumed
//! by an external microcontroller:
//!
//! - A MIDI input device (note on/off, pitch bend, control change)
//! - The computer keyboard, playing notes on two channels
//!
//! Every event becomes a fixed 3-byte frame (see `notewire-proto`) written
//! to the serial port by a single router thread, so frames from the two
//! sources never interleave mid-frame.
//!
//! # Usage as a Library
//!
//! ```no_run
//! use notewire_bridge::{Keyboard, serial::MemorySink};
//! use notewire_bridge::serial::FrameSink;
//!
//! let mut keyboard = Keyboard::default();
//! let mut sink = MemorySink::new();
//!
//! // 'i' plays note 60 on channel 1
//! if let Some(event) = keyboard.key_down('i') {
//!     sink.write_frame(&event.encode().unwrap()).unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod keyboard;
pub mod logger;
pub mod midi;
pub mod os_keyboard;
pub mod router;
pub mod serial;
pub mod ui;

// Re-export main types
pub use config::{Config, KeyboardSettings, MidiSettings, SerialSettings, Theme};
pub use error::{Error, Result};
pub use keyboard::{binding_for, KeyBinding, Keyboard, BINDINGS};
pub use midi::{MidiDeviceInfo, MidiInputManager};
pub use os_keyboard::{is_available as os_keyboard_available, OsKeyEvent, OsKeyboardListener};
pub use router::Router;
pub use serial::{FrameSink, MemorySink, SerialSink};
