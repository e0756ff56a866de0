//! Error types for the bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bridge
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// MIDI device error (enumeration, connection)
    #[error("MIDI error: {0}")]
    Midi(String),

    /// Serial port error (enumeration, open)
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// Frame write failure. Non-retryable; the caller decides whether
    /// to drop the event or terminate.
    #[error("Transport error: {0}")]
    Transport(std::io::Error),

    /// Wire protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] notewire_proto::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
