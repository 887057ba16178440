//! Decoding and encoding of complete controller packets

mod common;

use common::*;
use vento_lib::commands;
use vento_lib::status::FilterTimer;

#[test]
fn test_status_response_fixture() {
    let bytes = hex_to_bytes(STATUS_RESPONSE);
    let response = Response::try_from(&bytes[..]).expect("Failed to decode status response");

    assert_eq!(response.device_id, DEVICE_ID);
    let status = response.status;
    assert_eq!(status.power, Some(true));
    assert_eq!(status.mode, Some(Mode::HeatRecovery));
    assert_eq!(status.speed, Some(Speed::Medium));
    assert_eq!(status.manual_speed, Some(128));
    assert_eq!(status.fan1_rpm, Some(1185));
    assert_eq!(status.filter_alarm, Some(false));
    assert_eq!(
        status.filter_timer,
        Some(FilterTimer {
            minutes: 15,
            hours: 5,
            days: 83
        })
    );
    assert_eq!(status.humidity, Some(43));
    assert!(response.unsupported.is_empty());
}

#[test]
fn test_firmware_response_fixture() {
    let bytes = hex_to_bytes(FIRMWARE_RESPONSE);
    let status = Response::try_from(&bytes[..]).unwrap().status;

    assert_eq!(status.firmware_version().as_deref(), Some("0.11"));
    assert_eq!(status.firmware_date().as_deref(), Some("1-12-2021"));
    assert_eq!(status.unit_type, Some(UnitType::VentoExpertA30));
    assert_eq!(status.unit_type.map(|t| t.to_string()).as_deref(), Some("Vento Expert A30 W V.2"));
    assert_eq!(status.power, None);
}

#[test]
fn test_status_request_matches_response_order() {
    let packet = commands::status()
        .encode(DEVICE_ID, "1111", ParameterCatalog::standard())
        .unwrap();

    // header, id, password, READ, eight parameters, checksum
    let params_start = 3 + 1 + 16 + 1 + 4 + 1;
    assert_eq!(packet[params_start - 1], 0x01);
    assert_eq!(
        &packet[params_start..params_start + 8],
        &[0x01, 0xB7, 0x02, 0x44, 0x4A, 0x88, 0x64, 0x25]
    );
    assert_eq!(packet.len(), params_start + 8 + 2);
}

#[test]
fn test_firmware_request() {
    let packet = commands::firmware().encode(DEVICE_ID, "", ParameterCatalog::standard()).unwrap();
    let function_at = 3 + 1 + 16 + 1;
    assert_eq!(&packet[function_at..function_at + 3], &[0x01, 0x86, 0xB9]);
}

#[test]
fn test_commands_encode() {
    let catalog = ParameterCatalog::standard();
    let tail = |request: Request| {
        let packet = request.encode("ABC123", "", catalog).unwrap();
        // function and parameters, without header, identity and checksum
        packet[11..packet.len() - 2].to_vec()
    };

    assert_eq!(tail(commands::power(true)), vec![0x03, 0x01, 0x01]);
    assert_eq!(tail(commands::power(false)), vec![0x03, 0x01, 0x00]);
    assert_eq!(tail(commands::speed(Speed::High)), vec![0x03, 0x02, 0x03]);
    assert_eq!(tail(commands::speed(Speed::Manual)), vec![0x03, 0x02, 0xFF]);
    assert_eq!(tail(commands::manual_speed(150)), vec![0x03, 0x44, 150]);
    assert_eq!(tail(commands::mode(Mode::Supply)), vec![0x03, 0xB7, 0x02]);
    assert_eq!(tail(commands::humidity_threshold(60)), vec![0x03, 0x19, 60]);
    assert_eq!(tail(commands::reset_alarms()), vec![0x02, 0x80, 0x01]);
}

#[test]
fn test_password_is_carried() {
    let frame = response_frame(DEVICE_ID, "1111", &[0x01, 0x01]);
    let response = Response::try_from(frame.as_slice()).unwrap();
    assert_eq!(response.password, "1111");
    assert_eq!(response.status.power, Some(true));
}

#[test]
fn test_extra_attributes() {
    let frame = response_frame(
        DEVICE_ID,
        "",
        &[
            0x06, 0x01, // boost on
            0x07, 0x02, // party timer
            0x0B, 0x1E, 0x0A, 0x01, // 01:10:30 left
            0x19, 0x3C, // 60 % threshold
            0x24, 0x2C, 0x0B, // 2860 mV
            0x7E, 0x05, 0x03, 0x2C, 0x01, // 300 days 3 h 5 min
            0x83, 0x02, // warning
            0xA3, 0xC0, 0xA8, 0x01, 0x32, // 192.168.1.50
        ],
    );
    let status = Response::try_from(frame.as_slice()).unwrap().status;

    assert_eq!(status.boost_active, Some(true));
    assert_eq!(status.timer_mode.map(|m| m.to_string()).as_deref(), Some("party"));
    assert_eq!(status.timer_countdown.map(|t| t.to_string()).as_deref(), Some("01:10:30"));
    assert_eq!(status.humidity_threshold, Some(60));
    assert_eq!(status.rtc_battery_mv, Some(2860));
    let hours = status.machine_hours.unwrap();
    assert_eq!(hours.days, 300);
    assert_eq!(hours.total_minutes(), (300 * 24 + 3) * 60 + 5);
    assert_eq!(status.alarm.map(|a| a.to_string()).as_deref(), Some("warning"));
    assert_eq!(status.current_ip, Some(std::net::Ipv4Addr::new(192, 168, 1, 50)));
}

#[test]
fn test_unknown_enum_values_are_kept() {
    let frame = response_frame(DEVICE_ID, "", &[0x02, 0x07, 0xB7, 0x09]);
    let status = Response::try_from(frame.as_slice()).unwrap().status;
    assert_eq!(status.speed, Some(Speed::Unknown(7)));
    assert_eq!(status.mode, Some(Mode::Unknown(9)));
    assert_eq!(status.mode.unwrap().to_string(), "unknown");
}

#[test]
fn test_echoed_search_is_benign() {
    let packet = vento_lib::discovery::search_packet(ParameterCatalog::standard()).unwrap();
    let err = Response::try_from(&packet[..]).unwrap_err();
    assert_eq!(err, DecodeError::NotAResponse(0x01));
    assert!(err.is_benign());
}

#[test]
fn test_corrupted_fixture_is_rejected() {
    let mut bytes = hex_to_bytes(STATUS_RESPONSE).to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    assert!(matches!(
        Response::try_from(bytes.as_slice()),
        Err(DecodeError::ChecksumMismatch { .. })
    ));
}
