mod common;

use common::FakeBus;
use rpvscp::bme280::{read_identity, Bme280};
use rpvscp::structs::{ChipVariant, Reading};
use rpvscp::Error;

#[test]
fn test_identity() {
    let mut bus = FakeBus::bme280(0x60);
    let identity = read_identity(&mut bus).unwrap();
    assert_eq!(identity.chip_id, 0x60);
    assert_eq!(identity.version, 0x01);
    assert_eq!(identity.variant, ChipVariant::Bme280Full);
}

#[test]
fn test_full_reading() {
    let mut bus = FakeBus::bme280(0x60);
    let mut sensor = Bme280::new(&mut bus).unwrap();
    assert_eq!(sensor.calibration().dig_t1, 27504);

    let raw = sensor.read_raw().unwrap();
    assert_eq!((raw.pressure, raw.temperature, raw.humidity), (415148, 519888, 30000));

    let reading = sensor.read().unwrap();
    let Reading::Bme280Full(values) = reading else {
        panic!("expected a full reading, got {:?}", reading);
    };
    assert_eq!(values.temperature, 25.08);
    assert!((values.pressure - 1006.5325814481472).abs() < 1e-9);
    assert!((values.humidity - 55.000712804837015).abs() < 1e-9);
}

#[test]
fn test_forced_mode_configuration() {
    let mut bus = FakeBus::bme280(0x60);
    Bme280::new(&mut bus).unwrap().read_raw().unwrap();
    assert_eq!(bus.writes, vec![(0xF2, 0x02), (0xF4, 0x49)]);
}

#[test]
fn test_bmp280_has_no_humidity() {
    let mut bus = FakeBus::bme280(0x58);
    let reading = Bme280::new(&mut bus).unwrap().read().unwrap();
    assert!(matches!(reading, Reading::Bmp280PressureOnly { .. }));
    assert_eq!(reading.temperature(), 25.08);
    assert_eq!(reading.humidity(), None);
}

#[test]
fn test_unknown_chip() {
    let mut bus = FakeBus::bme280(0x55);
    assert!(matches!(Bme280::new(&mut bus), Err(Error::UnsupportedChip(0x55))));
}

#[test]
fn test_bme680_is_refused() {
    let mut bus = FakeBus::bme280(0x61);
    assert!(matches!(Bme280::new(&mut bus), Err(Error::UnsupportedChip(0x61))));
}
