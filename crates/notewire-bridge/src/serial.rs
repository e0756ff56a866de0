//! Serial frame sinks
//!
//! The router writes every frame through the [`FrameSink`] trait. The real
//! implementation wraps a serial port; [`MemorySink`] captures the byte
//! stream for tests and dry runs.
//!
//! A frame write is a single blocking 3-byte write with no partial-write
//! recovery, no retries and no backpressure handling: if the port blocks,
//! the router blocks with it. Frames are tiny and the transport is assumed
//! always ready.

use crate::config::SerialSettings;
use crate::error::{Error, Result};
use notewire_proto::WireFrame;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::Write;
use std::time::Duration;

/// Write timeout for the underlying port
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A sink for encoded frames
pub trait FrameSink: Send {
    /// Write one frame. Exactly 3 bytes, fire-and-forget.
    fn write_frame(&mut self, frame: &WireFrame) -> Result<()>;

    /// Name of the sink (port path) for display
    fn name(&self) -> &str;
}

/// Serial port sink
pub struct SerialSink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialSink {
    /// Open a serial port with the configured line parameters.
    ///
    /// When no port is configured, the last port of the sorted enumeration
    /// is used.
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let name = match &settings.port {
            Some(port) => port.clone(),
            None => default_port()?,
        };

        let port = serialport::new(name.as_str(), settings.baud_rate)
            .data_bits(to_data_bits(settings.data_bits)?)
            .parity(to_parity(&settings.parity)?)
            .stop_bits(to_stop_bits(settings.stop_bits)?)
            .timeout(WRITE_TIMEOUT)
            .open()?;

        log::info!("Opened serial port {} ({})", name, settings.line_label());

        Ok(Self { port, name })
    }
}

impl FrameSink for SerialSink {
    fn write_frame(&mut self, frame: &WireFrame) -> Result<()> {
        self.port
            .write_all(frame.as_ref())
            .map_err(Error::Transport)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory sink capturing the raw byte stream
#[derive(Debug, Default)]
pub struct MemorySink {
    bytes: Vec<u8>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured byte stream, frames back-to-back
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &WireFrame) -> Result<()> {
        self.bytes.extend_from_slice(frame.as_ref());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// List available serial port names, sorted
pub fn list_ports() -> Result<Vec<String>> {
    let mut names: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect();
    names.sort();
    Ok(names)
}

/// Pick the default port: the last of the sorted enumeration
fn default_port() -> Result<String> {
    list_ports()?
        .pop()
        .ok_or_else(|| Error::Config("No serial ports available".to_string()))
}

fn to_data_bits(bits: u8) -> Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(Error::Config(format!("Invalid data bits: {}", other))),
    }
}

fn to_parity(parity: &str) -> Result<Parity> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        other => Err(Error::Config(format!("Invalid parity: {}", other))),
    }
}

fn to_stop_bits(bits: u8) -> Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(Error::Config(format!("Invalid stop bits: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notewire_proto::MidiEvent;

    #[test]
    fn test_line_parameter_mapping() {
        assert_eq!(to_data_bits(8).unwrap(), DataBits::Eight);
        assert_eq!(to_data_bits(7).unwrap(), DataBits::Seven);
        assert!(to_data_bits(9).is_err());

        assert_eq!(to_parity("none").unwrap(), Parity::None);
        assert_eq!(to_parity("Even").unwrap(), Parity::Even);
        assert!(to_parity("mark").is_err());

        assert_eq!(to_stop_bits(1).unwrap(), StopBits::One);
        assert_eq!(to_stop_bits(2).unwrap(), StopBits::Two);
        assert!(to_stop_bits(0).is_err());
    }

    #[test]
    fn test_default_settings_match_firmware() {
        let settings = SerialSettings::default();
        assert_eq!(settings.baud_rate, 38400);
        assert_eq!(to_data_bits(settings.data_bits).unwrap(), DataBits::Eight);
        assert_eq!(to_parity(&settings.parity).unwrap(), Parity::None);
        assert_eq!(to_stop_bits(settings.stop_bits).unwrap(), StopBits::One);
    }

    #[test]
    fn test_memory_sink_captures_back_to_back() {
        let mut sink = MemorySink::new();

        let on = MidiEvent::NoteOn { channel: 0, note: 60, velocity: 100 }.encode().unwrap();
        let off = MidiEvent::NoteOff { channel: 1, note: 60 }.encode().unwrap();
        sink.write_frame(&on).unwrap();
        sink.write_frame(&off).unwrap();

        // No delimiters, frames in write order
        assert_eq!(sink.bytes(), &[144, 60, 100, 129, 60, 127]);
    }
}
