use crate::constants::*;
use crate::error::DecodeError;
use crate::packet::{FunctionCode, Reader, latin1, verify_frame};
use crate::parameter::{Parameter, ParameterCatalog, ValueSize};
use crate::status::{AlarmLevel, FilterTimer, Firmware, MachineHours, Mode, Speed, Status, TimerCountdown, TimerMode, UnitType};
use num_enum::FromPrimitive;
use std::net::Ipv4Addr;

/// A controller reply that passed every check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub device_id: String,
    pub password: String,
    /// Only the attributes present in this packet are set
    pub status: Status,
    /// Parameters the controller flagged as not supported
    pub unsupported: Vec<u16>,
}

impl Response {
    /// Decode and validate a received datagram.
    pub fn decode(data: &[u8], catalog: &ParameterCatalog) -> Result<Self, DecodeError> {
        verify_frame(data)?;

        let mut reader = Reader::new(data, HEADER_SIZE, data.len() - CHECKSUM_SIZE);
        let device_id = reader.text()?;
        let password = reader.text()?;
        let function = reader.u8()?;
        if function != u8::from(FunctionCode::Response) {
            return Err(DecodeError::NotAResponse(function));
        }

        let mut response = Response {
            device_id,
            password,
            ..Default::default()
        };

        // Stops one byte short of the checksum trailer.
        let bound = data.len() - 3;
        let mut high = 0u16;
        while reader.position() < bound {
            let tag = reader.u8()?;
            match tag {
                SC_CHANGE_HIGH_BYTE => {
                    high = reader.u8()? as u16;
                    continue;
                }
                SC_CHANGE_FUNCTION => {
                    reader.u8()?;
                    continue;
                }
                SC_NOT_SUPPORTED => {
                    let low = reader.u8()? as u16;
                    response.unsupported.push(high << 8 | low);
                    continue;
                }
                _ => {}
            }

            let (code, len) = if tag == SC_CHANGE_VALUE_SIZE {
                let len = reader.u8()? as usize;
                let code = high << 8 | reader.u8()? as u16;
                (code, len)
            } else {
                let code = high << 8 | tag as u16;
                let size = catalog.size_of(code).ok_or(DecodeError::UnknownParameter(code))?;
                let len = match (typed_len(code), size) {
                    (Some(len), _) => len,
                    (None, ValueSize::Fixed(n)) => n as usize,
                    (None, ValueSize::Text) => reader.u8()? as usize,
                };
                (code, len)
            };

            let value = reader.take(len)?;
            apply_parameter(&mut response.status, code, value)?;
        }

        if response.status.power == Some(false) {
            response.status.speed = Some(Speed::Off);
        }

        Ok(response)
    }

    /// Device id a validation request can be matched against.
    pub fn matches_device(&self, device_id: &str) -> bool {
        self.device_id == device_id || self.status.search_id.as_deref() == Some(device_id)
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = DecodeError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        Response::decode(data, ParameterCatalog::standard())
    }
}

/// Value length of a typed parameter that arrives without a size override.
///
/// Controllers put one byte after these unless an 0xFE prefix says
/// otherwise; multi-byte values always carry the prefix. The search field is
/// the exception and always holds a full device id. `None` for parameters
/// that are stepped over by their catalog size.
fn typed_len(code: u16) -> Option<usize> {
    match Parameter::try_from(code).ok()? {
        Parameter::Search => Some(SEARCH_ID_SIZE),
        Parameter::OnOff
        | Parameter::Speed
        | Parameter::ManualSpeed
        | Parameter::VentilationMode
        | Parameter::CurrentHumidity
        | Parameter::Fan1Rpm
        | Parameter::Fan2Rpm
        | Parameter::FirmwareVersion
        | Parameter::UnitType
        | Parameter::FilterAlarm
        | Parameter::FilterTimer => Some(1),
        _ => None,
    }
}

fn need(code: u16, value: &[u8], len: usize) -> Result<&[u8], DecodeError> {
    if value.len() < len {
        return Err(DecodeError::InvalidValue {
            parameter: code,
            len: value.len(),
        });
    }
    Ok(value)
}

/// Little-endian number from a one or two byte value.
fn le_u16(code: u16, value: &[u8]) -> Result<u16, DecodeError> {
    match value {
        [lo] => Ok(*lo as u16),
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        [] => Err(DecodeError::InvalidValue { parameter: code, len: 0 }),
    }
}

/// Store the typed form of one parameter. Parameters without a typed
/// representation are skipped.
fn apply_parameter(status: &mut Status, code: u16, value: &[u8]) -> Result<(), DecodeError> {
    let Ok(parameter) = Parameter::try_from(code) else {
        return Ok(());
    };
    let byte = |value: &[u8]| need(code, value, 1).map(|v| v[0]);

    match parameter {
        Parameter::OnOff => status.power = Some(byte(value)? != 0),
        Parameter::Speed => status.speed = Some(Speed::from_primitive(byte(value)?)),
        Parameter::ManualSpeed => status.manual_speed = Some(byte(value)?),
        Parameter::VentilationMode => status.mode = Some(Mode::from_primitive(byte(value)?)),
        Parameter::CurrentHumidity => status.humidity = Some(byte(value)?),
        Parameter::Fan1Rpm => status.fan1_rpm = Some(le_u16(code, value)?),
        Parameter::Fan2Rpm => status.fan2_rpm = Some(le_u16(code, value)?),
        Parameter::FilterAlarm => status.filter_alarm = Some(byte(value)? != 0),
        Parameter::FilterTimer => {
            let v = need(code, value, 3)?;
            status.filter_timer = Some(FilterTimer {
                minutes: v[0],
                hours: v[1],
                days: v[2],
            });
        }
        Parameter::FirmwareVersion => {
            let v = need(code, value, 6)?;
            status.firmware = Some(Firmware {
                major: v[0],
                minor: v[1],
                day: v[2],
                month: v[3],
                year: u16::from_le_bytes([v[4], v[5]]),
            });
        }
        Parameter::UnitType => status.unit_type = Some(UnitType::from_primitive(le_u16(code, value)?)),
        Parameter::Search => {
            let v = need(code, value, SEARCH_ID_SIZE)?;
            status.search_id = Some(latin1(&v[..SEARCH_ID_SIZE]));
        }
        Parameter::BoostModeStatus => status.boost_active = Some(byte(value)? != 0),
        Parameter::TimerMode => status.timer_mode = Some(TimerMode::from_primitive(byte(value)?)),
        Parameter::TimerCountdown => {
            let v = need(code, value, 3)?;
            status.timer_countdown = Some(TimerCountdown {
                seconds: v[0],
                minutes: v[1],
                hours: v[2],
            });
        }
        Parameter::HumidityThreshold => status.humidity_threshold = Some(byte(value)?),
        Parameter::RtcBatteryVoltage => status.rtc_battery_mv = Some(le_u16(code, value)?),
        Parameter::MachineHours => {
            let v = need(code, value, 4)?;
            status.machine_hours = Some(MachineHours {
                minutes: v[0],
                hours: v[1],
                days: u16::from_le_bytes([v[2], v[3]]),
            });
        }
        Parameter::ReadAlarm => status.alarm = Some(AlarmLevel::from_primitive(byte(value)?)),
        Parameter::CurrentIpAddress => {
            let v = need(code, value, 4)?;
            status.current_ip = Some(Ipv4Addr::new(v[0], v[1], v[2], v[3]));
        }
        _ => {}
    }
    Ok(())
}
