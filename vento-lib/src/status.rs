use chrono::NaiveDate;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use std::net::Ipv4Addr;
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fan speed selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Speed {
    #[strum(to_string = "off")]
    Off = 0,
    #[strum(to_string = "low")]
    Low = 1,
    #[strum(to_string = "medium")]
    Medium = 2,
    #[strum(to_string = "high")]
    High = 3,

    #[num_enum(catch_all)]
    #[strum(to_string = "unknown")]
    Unknown(u8),

    /// Speed taken from the manual speed setting
    #[strum(to_string = "manual")]
    Manual = 255,
}

/// Ventilation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Mode {
    /// One-way extract
    #[strum(to_string = "ventilation")]
    Ventilation = 0,
    /// Alternating two-way flow
    #[strum(to_string = "heat recovery")]
    HeatRecovery = 1,
    /// One-way supply
    #[strum(to_string = "supply")]
    Supply = 2,

    #[num_enum(catch_all)]
    #[strum(to_string = "unknown")]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum TimerMode {
    #[strum(to_string = "off")]
    Off = 0,
    #[strum(to_string = "night")]
    Night = 1,
    #[strum(to_string = "party")]
    Party = 2,

    #[num_enum(catch_all)]
    #[strum(to_string = "unknown")]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AlarmLevel {
    #[strum(to_string = "none")]
    None = 0,
    #[strum(to_string = "alarm")]
    Alarm = 1,
    #[strum(to_string = "warning")]
    Warning = 2,

    #[num_enum(catch_all)]
    #[strum(to_string = "unknown")]
    Unknown(u8),
}

/// Controller model family as reported by the unit type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u16)]
pub enum UnitType {
    /// Vento Expert A50-1 / A85-1 / A100-1 W V.2
    #[strum(to_string = "Vento Expert A50-1/A85-1/A100-1 W V.2")]
    VentoExpertW = 3,
    #[strum(to_string = "Vento Expert Duo A30-1 W V.2")]
    VentoExpertDuoA30 = 4,
    #[strum(to_string = "Vento Expert A30 W V.2")]
    VentoExpertA30 = 5,

    #[num_enum(catch_all)]
    #[strum(to_string = "unknown")]
    Unknown(u16),
}

/// Time left until the filter should be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterTimer {
    pub minutes: u8,
    pub hours: u8,
    pub days: u8,
}

impl fmt::Display for FilterTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days {} hours {} minutes", self.days, self.hours, self.minutes)
    }
}

/// Countdown of the active night/party timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimerCountdown {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
}

impl fmt::Display for TimerCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineHours {
    pub minutes: u8,
    pub hours: u8,
    pub days: u16,
}

impl MachineHours {
    pub fn total_minutes(&self) -> u64 {
        (self.days as u64 * 24 + self.hours as u64) * 60 + self.minutes as u64
    }
}

/// Firmware version and build date block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Firmware {
    pub major: u8,
    pub minor: u8,
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

impl Firmware {
    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Build date as the controller reports it, `day-month-year`.
    pub fn date(&self) -> String {
        format!("{}-{}-{}", self.day, self.month, self.year)
    }

    /// `None` when the controller reports an impossible date.
    pub fn build_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version(), self.date())
    }
}

/// Decoded controller attributes.
///
/// Used both as the delta carried by one response (only the parameters the
/// packet contained are `Some`) and as a device's cached state.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Status {
    pub power: Option<bool>,
    /// Effective speed; `Speed::Off` whenever power was reported off
    pub speed: Option<Speed>,
    pub manual_speed: Option<u8>,
    pub mode: Option<Mode>,
    /// Relative humidity, percent
    pub humidity: Option<u8>,
    pub fan1_rpm: Option<u16>,
    pub fan2_rpm: Option<u16>,
    pub filter_alarm: Option<bool>,
    pub filter_timer: Option<FilterTimer>,
    pub firmware: Option<Firmware>,
    pub unit_type: Option<UnitType>,
    /// Only present in search replies
    pub search_id: Option<String>,
    pub boost_active: Option<bool>,
    pub timer_mode: Option<TimerMode>,
    pub timer_countdown: Option<TimerCountdown>,
    pub humidity_threshold: Option<u8>,
    pub rtc_battery_mv: Option<u16>,
    pub machine_hours: Option<MachineHours>,
    pub alarm: Option<AlarmLevel>,
    pub current_ip: Option<Ipv4Addr>,
}

macro_rules! merge_fields {
    ($target:ident, $delta:ident, $changed:ident; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$delta.$field {
                if $target.$field.as_ref() != Some(value) {
                    $target.$field = Some(value.clone());
                    $changed = true;
                }
            }
        )+
    };
}

impl Status {
    /// Overwrite every field present in `delta`. Returns whether anything changed.
    pub fn merge(&mut self, delta: &Status) -> bool {
        let mut changed = false;
        merge_fields!(self, delta, changed;
            power, speed, manual_speed, mode, humidity, fan1_rpm, fan2_rpm,
            filter_alarm, filter_timer, firmware, unit_type, search_id,
            boost_active, timer_mode, timer_countdown, humidity_threshold,
            rtc_battery_mv, machine_hours, alarm, current_ip,
        );
        changed
    }

    pub fn is_empty(&self) -> bool {
        *self == Status::default()
    }

    pub fn filter_timer_text(&self) -> Option<String> {
        self.filter_timer.map(|t| t.to_string())
    }

    pub fn firmware_version(&self) -> Option<String> {
        self.firmware.map(|fw| fw.version())
    }

    pub fn firmware_date(&self) -> Option<String> {
        self.firmware.map(|fw| fw.date())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value.as_ref().map_or_else(|| "-".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "power: {}, speed: {}, manual speed: {}, mode: {}, humidity: {}%, fan1: {} rpm, filter alarm: {}, filter timer: {}",
            opt(&self.power),
            opt(&self.speed),
            opt(&self.manual_speed),
            opt(&self.mode),
            opt(&self.humidity),
            opt(&self.fan1_rpm),
            opt(&self.filter_alarm),
            opt(&self.filter_timer),
        )
    }
}
