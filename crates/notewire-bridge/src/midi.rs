//! MIDI input support
//!
//! Device discovery and connection via midir. The connection callback
//! parses raw bytes at the boundary and feeds accepted events straight
//! into the router channel; everything the bridge does not carry is
//! dropped there.

use crate::config::MidiSettings;
use crate::error::{Error, Result};
use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection};
use notewire_proto::MidiEvent;

/// Information about a MIDI input device
#[derive(Debug, Clone)]
pub struct MidiDeviceInfo {
    /// Device name (as reported by the system)
    pub name: String,
    /// Port index (for opening)
    pub port_index: usize,
}

/// MIDI input manager.
///
/// Owns the device connection; dropping the manager closes the device.
pub struct MidiInputManager {
    /// Client name reported to the MIDI subsystem
    client_name: String,
    /// Active connection (kept alive)
    connection: Option<MidiInputConnection<()>>,
    /// Info for the connected device
    device: Option<MidiDeviceInfo>,
}

impl MidiInputManager {
    pub fn new(settings: &MidiSettings) -> Self {
        Self {
            client_name: settings.client_name.clone(),
            connection: None,
            device: None,
        }
    }

    /// List available MIDI input devices
    pub fn list_devices(client_name: &str) -> Result<Vec<MidiDeviceInfo>> {
        let midi_in = MidiInput::new(client_name)
            .map_err(|e| Error::Midi(format!("Failed to create MIDI input: {}", e)))?;

        let ports = midi_in.ports();
        let mut devices = Vec::new();

        for (index, port) in ports.iter().enumerate() {
            let name = midi_in
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Device {}", index));
            devices.push(MidiDeviceInfo {
                name,
                port_index: index,
            });
        }

        Ok(devices)
    }

    /// Open a device by name (partial match, case-insensitive)
    pub fn open_by_name(&mut self, name: &str, tx: Sender<MidiEvent>) -> Result<MidiDeviceInfo> {
        let devices = Self::list_devices(&self.client_name)?;
        let name_lower = name.to_lowercase();

        let device = devices
            .into_iter()
            .find(|d| d.name.to_lowercase().contains(&name_lower))
            .ok_or_else(|| Error::Midi(format!("No MIDI device found matching '{}'", name)))?;

        self.open_by_index(device.port_index, tx)
    }

    /// Open the first available device
    pub fn open_first(&mut self, tx: Sender<MidiEvent>) -> Result<MidiDeviceInfo> {
        self.open_by_index(0, tx)
    }

    /// Open a device by port index
    pub fn open_by_index(&mut self, port_index: usize, tx: Sender<MidiEvent>) -> Result<MidiDeviceInfo> {
        let midi_in = MidiInput::new(&self.client_name)
            .map_err(|e| Error::Midi(format!("Failed to create MIDI input: {}", e)))?;

        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| Error::Midi(format!("Invalid MIDI port index: {}", port_index)))?;

        let name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown Device {}", port_index));

        let device_info = MidiDeviceInfo {
            name: name.clone(),
            port_index,
        };

        let connection = midi_in
            .connect(
                port,
                "notewire-input",
                move |timestamp, bytes, _| {
                    log::debug!("[MIDI RAW] timestamp={} bytes={:?}", timestamp, bytes);
                    if let Some(event) = MidiEvent::from_bytes(bytes) {
                        log::info!("{}", event);
                        // A send error means the router stopped; nothing
                        // useful can be done from the callback thread.
                        let _ = tx.send(event);
                    }
                },
                (),
            )
            .map_err(|e| Error::Midi(format!("Failed to connect to MIDI device: {}", e)))?;

        self.connection = Some(connection);
        self.device = Some(device_info.clone());

        log::info!("Connected to MIDI device: {} (port {})", name, port_index);

        Ok(device_info)
    }

    /// Info for the connected device, if any
    pub fn device(&self) -> Option<&MidiDeviceInfo> {
        self.device.as_ref()
    }

    /// Close the connection
    pub fn close(&mut self) {
        self.connection = None;
        self.device = None;
    }
}
