use std::io;
use thiserror::Error;

/// Why a received datagram was not accepted as a device response.
///
/// The codec never panics on input; every decode attempt ends in either a
/// parsed response or one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed header: packet too short or wrong start/type bytes")]
    MalformedHeader,

    #[error("Checksum mismatch: computed {computed:#06x}, packet carries {received:#06x}")]
    ChecksumMismatch { computed: u16, received: u16 },

    /// Expected for our own broadcast search echoed back to us.
    #[error("Not a response: function code {0:#04x}")]
    NotAResponse(u8),

    #[error("Unknown parameter {0:#06x} without a size override")]
    UnknownParameter(u16),

    #[error("Truncated packet: needed {needed} byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Invalid value for parameter {parameter:#06x}: {len} byte(s)")]
    InvalidValue { parameter: u16, len: usize },
}

impl DecodeError {
    /// True for failures that are part of normal traffic rather than corruption.
    pub fn is_benign(&self) -> bool {
        matches!(self, DecodeError::NotAResponse(_))
    }
}

/// Failures building an outgoing packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Packet too large: maximum {max} bytes, needed {needed}")]
    TooLarge { max: usize, needed: usize },

    #[error("{field} is not ASCII")]
    NonAscii { field: &'static str },

    #[error("{field} is too long: {len} bytes")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("Parameter {0:#06x} is not in the catalog")]
    UnknownParameter(u16),

    #[error("Value for parameter {parameter:#06x} is too long: {len} bytes")]
    ValueTooLong { parameter: u16, len: usize },
}

/// The primary error type for the `vento-lib` library.
#[derive(Error, Debug)]
pub enum VentoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Could not encode request: {0}")]
    Encode(#[from] EncodeError),

    #[error("Device {device_id} did not answer at {address}")]
    ValidationTimeout { device_id: String, address: std::net::SocketAddr },

    #[error("Device {0} is not registered")]
    UnknownDevice(String),

    #[error("Parameter {parameter:#06x} is not supported by unit type {unit_type}")]
    Unsupported { parameter: u16, unit_type: u16 },

    #[error("Client is closed")]
    Closed,
}
