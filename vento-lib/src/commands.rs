//! Requests for the operations a controller supports.
//!
//! Writes use WRITEREAD so the controller confirms the new value, except for
//! the reset commands which the controller never echoes.

use crate::packet::{FunctionCode, Request};
use crate::parameter::Parameter;
use crate::status::{Mode, Speed, TimerMode};
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Parameters read by a status request.
pub const STATUS_PARAMETERS: &[Parameter] = &[
    Parameter::OnOff,
    Parameter::VentilationMode,
    Parameter::Speed,
    Parameter::ManualSpeed,
    Parameter::Fan1Rpm,
    Parameter::FilterAlarm,
    Parameter::FilterTimer,
    Parameter::CurrentHumidity,
];

pub const FIRMWARE_PARAMETERS: &[Parameter] = &[Parameter::FirmwareVersion, Parameter::UnitType];

pub fn status() -> Request {
    Request::read(STATUS_PARAMETERS.iter().copied())
}

pub fn firmware() -> Request {
    Request::read(FIRMWARE_PARAMETERS.iter().copied())
}

pub fn power(on: bool) -> Request {
    Request::write_read(Parameter::OnOff, vec![on as u8])
}

pub fn speed(speed: Speed) -> Request {
    Request::write_read(Parameter::Speed, vec![u8::from(speed)])
}

/// Manual speed, 0..=255. Takes effect when speed is [`Speed::Manual`].
pub fn manual_speed(value: u8) -> Request {
    Request::write_read(Parameter::ManualSpeed, vec![value])
}

pub fn mode(mode: Mode) -> Request {
    Request::write_read(Parameter::VentilationMode, vec![u8::from(mode)])
}

pub fn timer_mode(mode: TimerMode) -> Request {
    Request::write_read(Parameter::TimerMode, vec![u8::from(mode)])
}

/// Humidity setpoint in percent RH. Controllers accept 40..=80.
pub fn humidity_threshold(percent: u8) -> Request {
    Request::write_read(Parameter::HumidityThreshold, vec![percent])
}

/// Restart the filter replacement countdown. Any value byte is accepted.
pub fn reset_filter_alarm() -> Request {
    Request::new(FunctionCode::Write).with_value(Parameter::ResetFilterTimer, vec![0x01])
}

pub fn reset_alarms() -> Request {
    Request::new(FunctionCode::Write).with_value(Parameter::ResetAlarms, vec![0x01])
}

/// Set the real time clock: time as seconds, minutes, hours and calendar as
/// day, weekday (Monday = 1), month, two-digit year.
pub fn set_clock(time: NaiveDateTime) -> Request {
    let clock = vec![time.second() as u8, time.minute() as u8, time.hour() as u8];
    let calendar = vec![
        time.day() as u8,
        time.weekday().number_from_monday() as u8,
        time.month() as u8,
        time.year().rem_euclid(100) as u8,
    ];
    Request::new(FunctionCode::WriteRead)
        .with_value(Parameter::RtcTime, clock)
        .with_value(Parameter::RtcCalendar, calendar)
}
