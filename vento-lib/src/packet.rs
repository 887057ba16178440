//! Wire framing for Vento Expert packets.
//!
//! ```text
//! +------+------+------+--------+----+--------+----------+------+--------+-------+-------+
//! | 0xFD | 0xFD | 0x02 | id len | id | pw len | password | func | params | ck lo | ck hi |
//! +------+------+------+--------+----+--------+----------+------+--------+-------+-------+
//! ```
//!
//! A written value that is not exactly one byte long is preceded by
//! `0xFE <len>`. The checksum is the 16-bit sum of every byte from the
//! protocol type through the last parameter byte.

use crate::constants::*;
use crate::error::{DecodeError, EncodeError};
use crate::parameter::{Parameter, ParameterCatalog};
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FunctionCode {
    /// Read parameter values
    Read = 0x01,
    /// Write without a reply
    Write = 0x02,
    /// Write, controller replies with the new values
    WriteRead = 0x03,
    /// Increment, controller replies with the new values
    IncRead = 0x04,
    /// Decrement, controller replies with the new values
    DecRead = 0x05,
    /// Controller reply to Read/WriteRead/IncRead/DecRead
    Response = 0x06,
}

/// One parameter in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamEntry {
    Read(u16),
    Write { parameter: u16, value: Bytes },
}

impl ParamEntry {
    pub fn parameter(&self) -> u16 {
        match self {
            ParamEntry::Read(parameter) => *parameter,
            ParamEntry::Write { parameter, .. } => *parameter,
        }
    }
}

/// A command for one controller: a function code and its parameters, in
/// the order they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub function: FunctionCode,
    pub entries: Vec<ParamEntry>,
}

impl Request {
    pub fn new(function: FunctionCode) -> Self {
        Self {
            function,
            entries: Vec::new(),
        }
    }

    /// Read request for the given parameters.
    pub fn read(parameters: impl IntoIterator<Item = Parameter>) -> Self {
        parameters
            .into_iter()
            .fold(Self::new(FunctionCode::Read), |request, p| request.with_read(p))
    }

    /// Write-and-confirm request for a single parameter.
    pub fn write_read(parameter: Parameter, value: impl Into<Bytes>) -> Self {
        Self::new(FunctionCode::WriteRead).with_value(parameter, value)
    }

    pub fn with_read(mut self, parameter: Parameter) -> Self {
        self.entries.push(ParamEntry::Read(parameter.code()));
        self
    }

    pub fn with_value(mut self, parameter: Parameter, value: impl Into<Bytes>) -> Self {
        self.entries.push(ParamEntry::Write {
            parameter: parameter.code(),
            value: value.into(),
        });
        self
    }

    /// Parameter numbers this request writes.
    pub fn written_parameters(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            ParamEntry::Write { parameter, .. } => Some(*parameter),
            ParamEntry::Read(_) => None,
        })
    }

    /// Encode for the given device identity with the standard size limit.
    pub fn encode(&self, device_id: &str, password: &str, catalog: &ParameterCatalog) -> Result<Bytes, EncodeError> {
        self.encode_with_limit(device_id, password, catalog, MAX_PACKET_SIZE)
    }

    pub fn encode_with_limit(
        &self,
        device_id: &str,
        password: &str,
        catalog: &ParameterCatalog,
        max_size: usize,
    ) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(max_size);
        buf.put_u8(PACKET_START);
        buf.put_u8(PACKET_START);
        buf.put_u8(PROTOCOL_TYPE);
        put_text(&mut buf, "device id", device_id)?;
        put_text(&mut buf, "password", password)?;
        buf.put_u8(self.function.into());

        let mut page = 0u8;
        for entry in &self.entries {
            let code = entry.parameter();
            if !catalog.contains(code) {
                return Err(EncodeError::UnknownParameter(code));
            }
            let [high, low] = code.to_be_bytes();
            if high != page {
                buf.put_u8(SC_CHANGE_HIGH_BYTE);
                buf.put_u8(high);
                page = high;
            }
            match entry {
                ParamEntry::Read(_) => buf.put_u8(low),
                ParamEntry::Write { value, .. } => {
                    let len = u8::try_from(value.len()).map_err(|_| EncodeError::ValueTooLong {
                        parameter: code,
                        len: value.len(),
                    })?;
                    // Controllers assume one byte unless told otherwise
                    if len != 1 {
                        buf.put_u8(SC_CHANGE_VALUE_SIZE);
                        buf.put_u8(len);
                    }
                    buf.put_u8(low);
                    buf.put_slice(value);
                }
            }
        }

        let needed = buf.len() + CHECKSUM_SIZE;
        if needed > max_size {
            return Err(EncodeError::TooLarge { max: max_size, needed });
        }
        let sum = checksum(&buf[PACKET_START_LEN..]);
        buf.put_u16_le(sum);
        Ok(buf.freeze())
    }
}

const PACKET_START_LEN: usize = 2;

fn put_text(buf: &mut BytesMut, field: &'static str, text: &str) -> Result<(), EncodeError> {
    if !text.is_ascii() {
        return Err(EncodeError::NonAscii { field });
    }
    let len = u8::try_from(text.len()).map_err(|_| EncodeError::FieldTooLong { field, len: text.len() })?;
    buf.put_u8(len);
    buf.put_slice(text.as_bytes());
    Ok(())
}

/// 16-bit wrapping sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

/// Check start bytes, protocol type and checksum of a received datagram.
pub fn verify_frame(data: &[u8]) -> Result<(), DecodeError> {
    if data.len() < MIN_PACKET_SIZE || data[..HEADER_SIZE] != [PACKET_START, PACKET_START, PROTOCOL_TYPE] {
        return Err(DecodeError::MalformedHeader);
    }
    let trailer = data.len() - CHECKSUM_SIZE;
    let computed = checksum(&data[PACKET_START_LEN..trailer]);
    let received = u16::from_le_bytes([data[trailer], data[trailer + 1]]);
    if computed != received {
        return Err(DecodeError::ChecksumMismatch { computed, received });
    }
    Ok(())
}

/// Bounds-checked cursor over a packet.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            data,
            pos: start,
            end: end.min(data.len()),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.end.saturating_sub(self.pos) < len {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: len,
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Length-prefixed string, one char per byte.
    pub(crate) fn text(&mut self) -> Result<String, DecodeError> {
        let len = self.u8()? as usize;
        Ok(latin1(self.take(len)?))
    }
}

pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
