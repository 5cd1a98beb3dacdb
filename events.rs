//! Events sent over the control channel by the one-shot commands.

use crate::error::{Error, Result};
use crate::vscp::measurement::{format_fixed, format_shortest, level1_string_payload, StringMeasurement};
use crate::vscp::{Guid, InformationType, MeasurementType, VscpClass, VscpEvent, VscpType};

const UNIT_CELSIUS: u8 = 1;

/// Class 10 temperature from the kernel's thermal zone reading in
/// millidegrees, e.g. `45277\n` → `45.277`.
pub fn cpu_temperature_event(guid: Guid, millidegrees: &str) -> Result<VscpEvent> {
    let raw = millidegrees.trim();
    let value: f64 = raw
        .parse()
        .map_err(|_| Error::Input(format!("thermal zone value '{}'", raw)))?;
    let text = format_shortest(value / 1000.0);
    VscpEvent::new(VscpClass::Measurement, MeasurementType::Temperature.into(), guid)?
        .with_data(&level1_string_payload(UNIT_CELSIUS, 0, &text))
}

/// Node heartbeat addressed to all zones and subzones.
pub fn heartbeat_event(guid: Guid) -> Result<VscpEvent> {
    VscpEvent::new(
        VscpClass::Information,
        VscpType::Information(InformationType::NodeHeartbeat),
        guid,
    )?
    .with_data(&[0, 255, 255])
}

/// One `digitemp -a -q` line, `<onewire-id> <temperature>`.
pub fn onewire_temperature_event(line: &str) -> Result<VscpEvent> {
    let mut fields = line.split_whitespace();
    let (Some(id), Some(temperature)) = (fields.next(), fields.next()) else {
        return Err(Error::Input(format!("expected '<id> <temperature>', got '{}'", line.trim())));
    };
    if id.len() != 16 {
        return Err(Error::Input(format!("1-wire id '{}' is not 16 hex digits", id)));
    }
    let mut bytes = [0u8; 8];
    for (n, byte) in bytes.iter_mut().enumerate() {
        *byte = id
            .get(n * 2..n * 2 + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(|| Error::Input(format!("1-wire id '{}' is not hex", id)))?;
    }
    VscpEvent::new(
        VscpClass::Measurement,
        MeasurementType::Temperature.into(),
        Guid::from_onewire(bytes),
    )?
    .with_data(&level1_string_payload(UNIT_CELSIUS, 0, temperature))
}

/// Class 1040 measurement carrying `value` verbatim.
pub fn string_measurement_event(
    guid: Guid,
    kind: VscpType,
    measurement: &StringMeasurement,
) -> Result<VscpEvent> {
    VscpEvent::new(VscpClass::MeasurementStr, kind, guid)?.with_data(&measurement.payload())
}

/// Class 1040 illuminance, `%.2f` lux.
pub fn illuminance_event(guid: Guid, lux: f64, sensor_index: u8, zone: u8, subzone: u8) -> Result<VscpEvent> {
    let measurement = StringMeasurement::new(sensor_index, zone, subzone, 0, format_fixed(lux, 2));
    string_measurement_event(guid, MeasurementType::Illuminance.into(), &measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vscp::level1::encode_line;

    #[test]
    fn test_cpu_temperature() {
        let event = cpu_temperature_event(Guid::NULL, "45277\n").unwrap();
        assert_eq!(
            encode_line(&event),
            "3,10,6,,0,0,-,0x48,0x34,0x35,0x2e,0x32,0x37,0x37"
        );
    }

    #[test]
    fn test_cpu_temperature_is_truncated() {
        let event = cpu_temperature_event(Guid::NULL, "45277123").unwrap();
        assert_eq!(&event.data.as_slice()[1..], b"45277.1");
    }

    #[test]
    fn test_cpu_temperature_rejects_garbage() {
        assert!(matches!(cpu_temperature_event(Guid::NULL, "hot"), Err(Error::Input(_))));
    }

    #[test]
    fn test_string_measurement_with_unnamed_type() {
        let measurement = StringMeasurement::new(1, 0, 0, 2, "7.25".to_string());
        let event = string_measurement_event(Guid::NULL, VscpType::measurement(71), &measurement).unwrap();
        assert_eq!(event.class, VscpClass::MeasurementStr);
        assert_eq!(event.vscp_type.code(), 71);
        assert_eq!(event.data.as_slice(), b"\x01\x00\x00\x027.25");
    }

    #[test]
    fn test_heartbeat() {
        assert_eq!(encode_line(&heartbeat_event(Guid::NULL).unwrap()), "3,20,9,,0,0,-,0x0,0xff,0xff");
    }

    #[test]
    fn test_onewire_line() {
        let event = onewire_temperature_event("10A1B2C3D4E5F600 21.5\n").unwrap();
        assert_eq!(
            encode_line(&event),
            "3,10,6,,0,0,FF:FF:FF:FF:FF:FF:FF:FF:00:F6:E5:D4:C3:B2:A1:10,0x48,0x32,0x31,0x2e,0x35"
        );
    }

    #[test]
    fn test_onewire_bad_lines() {
        assert!(onewire_temperature_event("10A1B2C3D4E5F600").is_err());
        assert!(onewire_temperature_event("10A1 21.5").is_err());
        assert!(onewire_temperature_event("10A1B2C3D4E5F6ZZ 21.5").is_err());
    }

    #[test]
    fn test_illuminance() {
        let event = illuminance_event(Guid::NULL, 123.456, 1, 2, 3).unwrap();
        assert_eq!(encode_line(&event), "3,1040,25,,0,0,-,0x1,0x2,0x3,0x0,0x31,0x32,0x33,0x2e,0x34,0x36");
    }
}
