//! Silicon Labs SensorPuck BLE advertisements.
//!
//! The advertisement is taken as the hex string a scanner reports for the
//! manufacturer data field. Scanning itself happens elsewhere.

use crate::error::{Error, Result};
use crate::mac::MacAddress;
use crate::vscp::measurement::{datacoding, format_shortest, DataCoding, StringMeasurement};
use crate::vscp::{DataType, Guid, GuidPrefix, MeasurementType, VscpClass, VscpEvent, VscpType, WeatherType};

pub const ADVERTISEMENT_LEN: usize = 28;
const MARKER: &str = "aa4a";

const SUFFIX_TEMPERATURE: u16 = 0x0001;
const SUFFIX_HUMIDITY: u16 = 0x0002;
const SUFFIX_LIGHT: u16 = 0x0003;
const SUFFIX_UV: u16 = 0x0004;
const SUFFIX_BATTERY: u16 = 0x0005;
const SUFFIX_SIGNAL: u16 = 0x0008;

const UNIT_DBM: u8 = 2;
const UNIT_CELSIUS: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPuckSample {
    /// %RH
    pub humidity: f64,
    /// °C
    pub temperature: f64,
    /// lux
    pub light: u32,
    pub uv_index: u8,
    /// V
    pub battery: f64,
}

fn hex_u8(hex: &str, at: usize) -> Result<u8> {
    hex.get(at..at + 2)
        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        .ok_or_else(|| Error::Input(format!("advertisement '{}' is not hex at {}", hex, at)))
}

fn hex_u16_le(hex: &str, at: usize) -> Result<u16> {
    Ok(u16::from_le_bytes([hex_u8(hex, at)?, hex_u8(hex, at + 2)?]))
}

/// `Ok(None)` when the advertisement does not come from a SensorPuck.
pub fn parse_advertisement(hex: &str) -> Result<Option<SensorPuckSample>> {
    let hex = hex.trim();
    if hex.len() != ADVERTISEMENT_LEN || !hex.get(8..12).is_some_and(|m| m.eq_ignore_ascii_case(MARKER)) {
        return Ok(None);
    }
    Ok(Some(SensorPuckSample {
        humidity: f64::from(hex_u16_le(hex, 12)?) / 10.0,
        temperature: f64::from(hex_u16_le(hex, 16)?) / 10.0,
        light: u32::from(hex_u16_le(hex, 20)?) * 2,
        uv_index: hex_u8(hex, 24)?,
        battery: f64::from(hex_u8(hex, 26)?) / 10.0,
    }))
}

/// Signal quality, humidity, temperature, light, UV index and battery
/// voltage, each from its own GUID under the Bluetooth prefix.
pub fn events(mac: &MacAddress, rssi: i8, sample: &SensorPuckSample) -> Result<Vec<VscpEvent>> {
    let guid = |suffix: u16| Guid::from_mac(GuidPrefix::Bluetooth, mac, suffix);
    let string_event = |suffix: u16, kind: MeasurementType, unit: u8, value: String| -> Result<VscpEvent> {
        VscpEvent::new(VscpClass::MeasurementStr, kind.into(), guid(suffix))?
            .with_data(&StringMeasurement::new(0, 0, 0, unit, value).payload())
    };

    Ok(vec![
        VscpEvent::new(VscpClass::Data, VscpType::Data(DataType::SignalQuality), guid(SUFFIX_SIGNAL))?
            .with_data(&[datacoding(DataCoding::Integer, UNIT_DBM, 0), rssi as u8])?,
        string_event(
            SUFFIX_HUMIDITY,
            MeasurementType::Humidity,
            0,
            format_shortest(sample.humidity),
        )?,
        string_event(
            SUFFIX_TEMPERATURE,
            MeasurementType::Temperature,
            UNIT_CELSIUS,
            format_shortest(sample.temperature),
        )?,
        string_event(SUFFIX_LIGHT, MeasurementType::Illuminance, 0, sample.light.to_string())?,
        VscpEvent::new(VscpClass::Weather, VscpType::Weather(WeatherType::UvIndex), guid(SUFFIX_UV))?
            .with_data(&[0, 0, sample.uv_index])?,
        string_event(
            SUFFIX_BATTERY,
            MeasurementType::ElectricalPotential,
            0,
            format_shortest(sample.battery),
        )?,
    ])
}

/// One scanner line: `<bt-mac> <rssi> <advertisement-hex>`.
pub fn parse_line(line: &str) -> Result<(MacAddress, i8, String)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [mac, rssi, advertisement] = fields[..] else {
        return Err(Error::Input(format!(
            "expected '<mac> <rssi> <advertisement>', got '{}'",
            line.trim()
        )));
    };
    let rssi = rssi
        .parse::<i8>()
        .map_err(|_| Error::Input(format!("rssi '{}'", rssi)))?;
    Ok((mac.parse()?, rssi, advertisement.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_devices_are_skipped() {
        assert_eq!(parse_advertisement("0201061aff4c000215").unwrap(), None);
        assert_eq!(parse_advertisement("0201061aff4c000215e5220a010000ff").unwrap(), None);
        assert_eq!(parse_advertisement("02010612bb4a0000000000000000").unwrap(), None);
    }

    #[test]
    fn test_bad_hex_is_an_error() {
        assert!(parse_advertisement("02010612aa4aZZ00000000000000").is_err());
    }

    #[test]
    fn test_parse_line() {
        let (mac, rssi, adv) = parse_line("00:0b:57:1a:2b:3c -67 02010612aa4a").unwrap();
        assert_eq!(mac.to_string(), "00:0b:57:1a:2b:3c");
        assert_eq!(rssi, -67);
        assert_eq!(adv, "02010612aa4a");
        assert!(parse_line("00:0b:57:1a:2b:3c -67").is_err());
        assert!(parse_line("00:0b:57:1a:2b:3c -300 02010612aa4a").is_err());
    }
}
