mod common;

use common::FakeBus;
use rpvscp::bh1750::Bh1750;
use rpvscp::events::illuminance_event;
use rpvscp::vscp::Guid;

#[test]
fn test_read_lux() {
    let mut bus = FakeBus::new();
    bus.raw.push_back(vec![0x01, 0x2C]);
    let lux = Bh1750::new(&mut bus).unwrap().read_lux().unwrap();
    assert!((lux - 250.0).abs() < 1e-9);
    assert_eq!(bus.commands, vec![0x01, 0x11]);
}

#[test]
fn test_lux_as_string_measurement() {
    let mut bus = FakeBus::new();
    bus.raw.push_back(vec![0x00, 0x0C]);
    let lux = Bh1750::new(&mut bus).unwrap().read_lux().unwrap();
    let event = illuminance_event(Guid::NULL, lux, 0, 0, 0).unwrap();
    assert_eq!(&event.data.as_slice()[4..], b"10.00");
}
