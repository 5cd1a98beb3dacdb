//! Measurement payload helpers: the datacoding byte of Level I frames and the
//! header + ASCII layout of Level II string measurements.

/// Longest value string that fits a Level I frame behind its datacoding byte.
pub const LEVEL1_STRING_MAX: usize = 7;

/// Payload format, bits 5..7 of the datacoding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataCoding {
    Bits = 0x00,
    Byte = 0x20,
    String = 0x40,
    Integer = 0x60,
    NormalizedInteger = 0x80,
    SinglePrecision = 0xA0,
}

/// Packs format, unit (0..=3) and sensor index (0..=7) into one byte.
pub fn datacoding(coding: DataCoding, unit: u8, sensor_index: u8) -> u8 {
    coding as u8 | ((unit & 0x03) << 3) | (sensor_index & 0x07)
}

/// `%.Nf` rendering.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Shortest round-trip rendering that always carries a decimal point,
/// e.g. `21.0`, `45.277`.
pub fn format_shortest(value: f64) -> String {
    let mut s = format!("{}", value);
    if value.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Trim and cut a value string down to what a Level I frame can carry.
pub fn truncate_level1(value: &str) -> &str {
    let value = value.trim();
    match value.char_indices().nth(LEVEL1_STRING_MAX) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Level I string measurement: datacoding byte followed by up to seven
/// ASCII characters.
pub fn level1_string_payload(unit: u8, sensor_index: u8, value: &str) -> Vec<u8> {
    let mut payload = vec![datacoding(DataCoding::String, unit, sensor_index)];
    payload.extend_from_slice(truncate_level1(value).as_bytes());
    payload
}

/// Level II string measurement (class 1040) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMeasurement {
    pub sensor_index: u8,
    pub zone: u8,
    pub subzone: u8,
    pub unit: u8,
    pub value: String,
    /// Append the optional terminating zero.
    pub terminate: bool,
}

impl StringMeasurement {
    pub fn new(sensor_index: u8, zone: u8, subzone: u8, unit: u8, value: impl Into<String>) -> Self {
        StringMeasurement {
            sensor_index,
            zone,
            subzone,
            unit,
            value: value.into(),
            terminate: false,
        }
    }

    pub fn terminated(mut self) -> Self {
        self.terminate = true;
        self
    }

    /// `sensorindex, zone, subzone, unit` then the value bytes. CR and LF
    /// picked up from source text are dropped.
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = vec![self.sensor_index, self.zone, self.subzone, self.unit];
        payload.extend(self.value.bytes().filter(|b| *b != b'\r' && *b != b'\n'));
        if self.terminate {
            payload.push(0);
        }
        payload
    }
}
