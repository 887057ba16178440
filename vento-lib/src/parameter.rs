//! Parameter numbers and the catalog of their value sizes.
//!
//! Every controller attribute is addressed by a parameter number. On the wire
//! only the low byte is sent; numbers above 0xFF are reached by switching the
//! high byte with the 0xFF special command first. The catalog records how many
//! value bytes follow a parameter when no explicit size override is present,
//! which is what lets the decoder step over attributes it has no typed
//! representation for.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::collections::HashMap;
use std::sync::LazyLock;
use strum_macros::Display;

/// How many value bytes follow a parameter number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSize {
    /// Always exactly this many bytes.
    Fixed(u8),
    /// Text; the length is given by a count byte ahead of the characters.
    Text,
}

impl ValueSize {
    /// Catalog notation: 0 stands for text.
    pub fn from_catalog_len(len: u8) -> Self {
        if len == 0 { ValueSize::Text } else { ValueSize::Fixed(len) }
    }

    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            ValueSize::Fixed(n) => Some(*n as usize),
            ValueSize::Text => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Parameter {
    OnOff = 0x01,
    Speed = 0x02,
    BoostModeStatus = 0x06,
    TimerMode = 0x07,
    TimerCountdown = 0x0B,
    HumiditySensor = 0x0F,
    RelaySensor = 0x14,
    AnalogSensor = 0x16,
    HumidityThreshold = 0x19,
    RtcBatteryVoltage = 0x24,
    CurrentHumidity = 0x25,
    CurrentAnalogSensorValue = 0x2D,
    CurrentRelayState = 0x32,
    SupplyFanSpeed1 = 0x3A,
    ExhaustFanSpeed1 = 0x3B,
    SupplyFanSpeed2 = 0x3C,
    ExhaustFanSpeed2 = 0x3D,
    SupplyFanSpeed3 = 0x3E,
    ExhaustFanSpeed3 = 0x3F,
    ManualSpeed = 0x44,
    Fan1Rpm = 0x4A,
    Fan2Rpm = 0x4B,
    FilterReplacementTime = 0x63,
    FilterTimer = 0x64,
    ResetFilterTimer = 0x65,
    BoostDeactivationSetpoint = 0x66,
    RtcTime = 0x6F,
    RtcCalendar = 0x70,
    WeeklySchedule = 0x72,
    ScheduleSetup = 0x77,
    Search = 0x7C,
    DevicePassword = 0x7D,
    MachineHours = 0x7E,
    ResetAlarms = 0x80,
    ReadAlarm = 0x83,
    CloudOperation = 0x85,
    FirmwareVersion = 0x86,
    RestoreFactorySettings = 0x87,
    FilterAlarm = 0x88,
    WifiOperationMode = 0x94,
    WifiClientName = 0x95,
    WifiPassword = 0x96,
    WifiEncryption = 0x99,
    WifiChannel = 0x9A,
    WifiIpMode = 0x9B,
    AssignedIpAddress = 0x9C,
    AssignedSubnetMask = 0x9D,
    AssignedGateway = 0x9E,
    ApplyAndQuitSetup = 0xA0,
    DiscardAndQuitSetup = 0xA2,
    CurrentIpAddress = 0xA3,
    VentilationMode = 0xB7,
    AnalogSensorThreshold = 0xB8,
    UnitType = 0xB9,
    NightModeTimerSetpoint = 0x302,
    PartyModeTimerSetpoint = 0x303,
    HumiditySetpointStatus = 0x304,
    AnalogSensorStatus = 0x305,
}

impl Parameter {
    pub const ALL: &'static [Parameter] = &[
        Parameter::OnOff,
        Parameter::Speed,
        Parameter::BoostModeStatus,
        Parameter::TimerMode,
        Parameter::TimerCountdown,
        Parameter::HumiditySensor,
        Parameter::RelaySensor,
        Parameter::AnalogSensor,
        Parameter::HumidityThreshold,
        Parameter::RtcBatteryVoltage,
        Parameter::CurrentHumidity,
        Parameter::CurrentAnalogSensorValue,
        Parameter::CurrentRelayState,
        Parameter::SupplyFanSpeed1,
        Parameter::ExhaustFanSpeed1,
        Parameter::SupplyFanSpeed2,
        Parameter::ExhaustFanSpeed2,
        Parameter::SupplyFanSpeed3,
        Parameter::ExhaustFanSpeed3,
        Parameter::ManualSpeed,
        Parameter::Fan1Rpm,
        Parameter::Fan2Rpm,
        Parameter::FilterReplacementTime,
        Parameter::FilterTimer,
        Parameter::ResetFilterTimer,
        Parameter::BoostDeactivationSetpoint,
        Parameter::RtcTime,
        Parameter::RtcCalendar,
        Parameter::WeeklySchedule,
        Parameter::ScheduleSetup,
        Parameter::Search,
        Parameter::DevicePassword,
        Parameter::MachineHours,
        Parameter::ResetAlarms,
        Parameter::ReadAlarm,
        Parameter::CloudOperation,
        Parameter::FirmwareVersion,
        Parameter::RestoreFactorySettings,
        Parameter::FilterAlarm,
        Parameter::WifiOperationMode,
        Parameter::WifiClientName,
        Parameter::WifiPassword,
        Parameter::WifiEncryption,
        Parameter::WifiChannel,
        Parameter::WifiIpMode,
        Parameter::AssignedIpAddress,
        Parameter::AssignedSubnetMask,
        Parameter::AssignedGateway,
        Parameter::ApplyAndQuitSetup,
        Parameter::DiscardAndQuitSetup,
        Parameter::CurrentIpAddress,
        Parameter::VentilationMode,
        Parameter::AnalogSensorThreshold,
        Parameter::UnitType,
        Parameter::NightModeTimerSetpoint,
        Parameter::PartyModeTimerSetpoint,
        Parameter::HumiditySetpointStatus,
        Parameter::AnalogSensorStatus,
    ];

    /// Number as a `u16`, high byte included.
    pub fn code(self) -> u16 {
        self.into()
    }

    /// Value size used by the standard catalog.
    pub fn default_size(self) -> ValueSize {
        use Parameter::*;
        let len = match self {
            TimerCountdown | FilterTimer | RtcTime => 3,
            // Two bytes of setpoint, but the controllers report three.
            NightModeTimerSetpoint | PartyModeTimerSetpoint => 3,
            RtcBatteryVoltage | Fan1Rpm | Fan2Rpm | FilterReplacementTime | UnitType => 2,
            RtcCalendar | MachineHours | AssignedIpAddress | AssignedSubnetMask | AssignedGateway
            | CurrentIpAddress => 4,
            ScheduleSetup | FirmwareVersion => 6,
            Search => 16,
            DevicePassword | WifiClientName | WifiPassword => 0,
            _ => 1,
        };
        ValueSize::from_catalog_len(len)
    }
}

/// Immutable lookup from parameter number to value size.
///
/// The codec consults a catalog value instead of a global table, so a
/// different controller dialect can be described by building another one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCatalog {
    sizes: HashMap<u16, ValueSize>,
}

static STANDARD: LazyLock<ParameterCatalog> = LazyLock::new(|| {
    let sizes = Parameter::ALL
        .iter()
        .map(|p| (p.code(), p.default_size()))
        .collect();
    ParameterCatalog { sizes }
});

impl ParameterCatalog {
    /// A catalog with no entries.
    pub fn empty() -> Self {
        Self { sizes: HashMap::new() }
    }

    /// Every parameter the Vento Expert protocol defines.
    pub fn standard() -> &'static ParameterCatalog {
        &STANDARD
    }

    /// Add or replace one entry.
    pub fn with_parameter(mut self, code: u16, size: ValueSize) -> Self {
        self.sizes.insert(code, size);
        self
    }

    /// `None` means the parameter is unknown to this catalog.
    pub fn size_of(&self, code: u16) -> Option<ValueSize> {
        self.sizes.get(&code).copied()
    }

    pub fn contains(&self, code: u16) -> bool {
        self.sizes.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl Default for ParameterCatalog {
    fn default() -> Self {
        Self::standard().clone()
    }
}
