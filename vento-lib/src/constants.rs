// Protocol constants for Vento Expert controllers

use std::time::Duration;

/// Packet beginning character, repeated twice at the start of every packet
pub const PACKET_START: u8 = 0xFD;

/// Protocol type byte following the two start characters
pub const PROTOCOL_TYPE: u8 = 0x02;

/// Start characters plus protocol type
pub const HEADER_SIZE: usize = 3;

/// Trailing little-endian checksum
pub const CHECKSUM_SIZE: usize = 2;

/// Minimum size for a packet to be considered at all
pub const MIN_PACKET_SIZE: usize = 4;

/// Outbound buffer size; every defined command fits comfortably
pub const MAX_PACKET_SIZE: usize = 200;

/// Device id the controllers answer to when searching the network
pub const SEARCH_DEVICE_ID: &str = "DEFAULT_DEVICEID";

/// Size of the device id carried in a search reply
pub const SEARCH_ID_SIZE: usize = 16;

/// UDP port the controllers listen on
pub const DEVICE_PORT: u16 = 4000;

/// Default bound on waiting for a validation reply
pub const DEFAULT_VALIDATE_TIMEOUT: Duration = Duration::from_secs(3);

/// Largest UDP payload the receive task accepts
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Special command: change function number for the following parameters
pub const SC_CHANGE_FUNCTION: u8 = 0xFC;

/// Special command: parameter not supported (controller to client only)
pub const SC_NOT_SUPPORTED: u8 = 0xFD;

/// Special command: explicit value size for the next parameter
pub const SC_CHANGE_VALUE_SIZE: u8 = 0xFE;

/// Special command: change the high byte of following parameter numbers
pub const SC_CHANGE_HIGH_BYTE: u8 = 0xFF;
