//! Error types for the notewire protocol

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when encoding or decoding frames
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// An event field is outside its declared range (encode side).
    /// The codec never truncates or wraps; out-of-range input is a
    /// caller contract violation and is rejected explicitly.
    #[error("invalid event: {field} = {value} exceeds maximum {max}")]
    InvalidEvent {
        /// Name of the offending field
        field: &'static str,
        /// The value that was supplied
        value: u16,
        /// The largest value the field may hold
        max: u16,
    },

    /// A status byte without the marker bit set, or with an unassigned
    /// message-type tag (decode side)
    #[error("invalid status byte: {0:#04x}")]
    InvalidStatus(u8),

    /// A payload byte with bit 7 set (payload bytes are 7-bit)
    #[error("invalid payload byte: {0:#04x}")]
    InvalidPayload(u8),
}
