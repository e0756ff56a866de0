//! Configuration file support for notewire
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/notewire/config.toml`
//! - macOS: `~/Library/Application Support/notewire/config.toml`
//! - Windows: `%APPDATA%\notewire\config.toml`

use crate::error::{Error, Result};
use crate::keyboard::DEFAULT_NOTE_RELEASE_MS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial line configuration
    pub serial: SerialSettings,
    /// MIDI input configuration
    pub midi: MidiSettings,
    /// Keyboard configuration
    pub keyboard: KeyboardSettings,
    /// UI/Theme configuration
    pub theme: Theme,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "notewire") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = r#"# notewire configuration file
# https://github.com/notewire/notewire

[serial]
# Serial port path (e.g. "/dev/ttyUSB0" or "COM3").
# When unset, the last port of the sorted enumeration is used.
# port = "/dev/ttyUSB0"

# Line parameters. The defaults match the deployed receiver firmware
# (38400 baud, 8 data bits, no parity, 1 stop bit) - change them only
# if the firmware changes too.
baud_rate = 38400
data_bits = 8
parity = "none"
stop_bits = 1

[midi]
# MIDI input device name filter (case-insensitive substring).
# When unset, the first available device is used.
# device = "Launchkey"

# Client name reported to the MIDI subsystem
client_name = "notewire"

[keyboard]
# Auto-release timeout in milliseconds
# Notes are released after this time if no key-up event is detected
note_release_ms = 400

[theme]
# Colors for the key strip and activity log
pressed_key_color = "cyan"
key_color = "white"
border_color = "cyan"

# Show the key strip
show_keys = true
"#;

        fs::write(&path, content)?;
        Ok(path)
    }
}

/// Serial line settings. The defaults reproduce the wire contract of the
/// existing receiver firmware byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Serial port path; `None` selects the last port of the sorted
    /// enumeration
    pub port: Option<String>,
    /// Line rate in symbols/second
    pub baud_rate: u32,
    /// Data bits per symbol (5-8)
    pub data_bits: u8,
    /// Parity: "none", "odd" or "even"
    pub parity: String,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 38400,
            data_bits: 8,
            parity: "none".to_string(),
            stop_bits: 1,
        }
    }
}

impl SerialSettings {
    /// Short "38400 8N1" style description for display
    pub fn line_label(&self) -> String {
        let parity = self
            .parity
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('N');
        format!("{} {}{}{}", self.baud_rate, self.data_bits, parity, self.stop_bits)
    }
}

/// MIDI input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// Device name filter (case-insensitive substring); `None` selects
    /// the first available device
    pub device: Option<String>,
    /// Client name reported to the MIDI subsystem
    pub client_name: String,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            device: None,
            client_name: "notewire".to_string(),
        }
    }
}

/// Keyboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSettings {
    /// Auto-release timeout in milliseconds
    pub note_release_ms: u64,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            note_release_ms: DEFAULT_NOTE_RELEASE_MS,
        }
    }
}

/// Theme/UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Pressed key color
    pub pressed_key_color: String,
    /// Idle key color
    pub key_color: String,
    /// Border color
    pub border_color: String,
    /// Show the key strip
    pub show_keys: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            pressed_key_color: "cyan".to_string(),
            key_color: "white".to_string(),
            border_color: "cyan".to_string(),
            show_keys: true,
        }
    }
}

impl Theme {
    /// Parse a color string to ratatui Color
    pub fn parse_color(s: &str) -> ratatui::style::Color {
        use ratatui::style::Color;
        match s.to_lowercase().as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "gray" | "grey" => Color::Gray,
            "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Color::DarkGray,
            "white" => Color::White,
            // Try parsing as RGB hex
            s if s.starts_with('#') && s.len() == 7 => {
                if let (Ok(r), Ok(g), Ok(b)) = (
                    u8::from_str_radix(&s[1..3], 16),
                    u8::from_str_radix(&s[3..5], 16),
                    u8::from_str_radix(&s[5..7], 16),
                ) {
                    Color::Rgb(r, g, b)
                } else {
                    Color::White
                }
            }
            _ => Color::White,
        }
    }

    /// Get pressed key color
    pub fn pressed_key(&self) -> ratatui::style::Color {
        Self::parse_color(&self.pressed_key_color)
    }

    /// Get idle key color
    pub fn key(&self) -> ratatui::style::Color {
        Self::parse_color(&self.key_color)
    }

    /// Get border color
    pub fn border(&self) -> ratatui::style::Color {
        Self::parse_color(&self.border_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud_rate, 38400);
        assert_eq!(config.serial.data_bits, 8);
        assert_eq!(config.serial.parity, "none");
        assert_eq!(config.serial.stop_bits, 1);
        assert_eq!(config.keyboard.note_release_ms, 400);
        assert!(config.serial.port.is_none());
        assert!(config.midi.device.is_none());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.serial.port = Some("/dev/ttyUSB0".to_string());
        config.midi.device = Some("Launchkey".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(parsed.serial.baud_rate, 38400);
        assert_eq!(parsed.midi.device.as_deref(), Some("Launchkey"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[serial]\nbaud_rate = 9600\n").unwrap();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.data_bits, 8);
        assert_eq!(config.keyboard.note_release_ms, 400);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.serial.baud_rate = 115200;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(loaded.serial.baud_rate, 115200);
    }

    #[test]
    fn test_line_label() {
        assert_eq!(SerialSettings::default().line_label(), "38400 8N1");

        let settings = SerialSettings {
            baud_rate: 9600,
            parity: "even".to_string(),
            stop_bits: 2,
            ..Default::default()
        };
        assert_eq!(settings.line_label(), "9600 8E2");
    }

    #[test]
    fn test_color_parsing() {
        use ratatui::style::Color;
        assert_eq!(Theme::parse_color("cyan"), Color::Cyan);
        assert_eq!(Theme::parse_color("white"), Color::White);
        assert_eq!(Theme::parse_color("#ff0000"), Color::Rgb(255, 0, 0));
        assert_eq!(Theme::parse_color("nonsense"), Color::White);
    }
}
