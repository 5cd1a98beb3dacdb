//! BME280 / BMP280 compensation and the derived quantities published with it.
//!
//! Temperature uses the datasheet's integer path to produce `t_fine`; pressure
//! and humidity use the double precision formulas on top of it.

use crate::registers::{i16_at, i8_at, u16_at, u8_at};
use crate::structs::{CalibratedReading, CalibrationTable, RawSample};

pub const CALIB_00_LEN: usize = 24;
pub const CALIB_26_LEN: usize = 7;

impl CalibrationTable {
    /// Build the table from the 0x88..0x9F block, the 0xA1 byte and the
    /// 0xE1..0xE7 block.
    pub fn from_blocks(cal1: &[u8; CALIB_00_LEN], cal2: u8, cal3: &[u8; CALIB_26_LEN]) -> Self {
        // dig_H4 and dig_H5 share the nibbles of 0xE5
        let dig_h4 = (i16::from(i8_at(cal3, 3)) << 4) | i16::from(u8_at(cal3, 4) & 0x0F);
        let dig_h5 = (i16::from(i8_at(cal3, 5)) << 4) | i16::from(u8_at(cal3, 4) >> 4);

        CalibrationTable {
            dig_t1: u16_at(cal1, 0),
            dig_t2: i16_at(cal1, 2),
            dig_t3: i16_at(cal1, 4),
            dig_p1: u16_at(cal1, 6),
            dig_p2: i16_at(cal1, 8),
            dig_p3: i16_at(cal1, 10),
            dig_p4: i16_at(cal1, 12),
            dig_p5: i16_at(cal1, 14),
            dig_p6: i16_at(cal1, 16),
            dig_p7: i16_at(cal1, 18),
            dig_p8: i16_at(cal1, 20),
            dig_p9: i16_at(cal1, 22),
            dig_h1: cal2,
            dig_h2: i16_at(cal3, 0),
            dig_h3: u8_at(cal3, 2),
            dig_h4,
            dig_h5,
            dig_h6: i8_at(cal3, 6),
        }
    }
}

pub fn fine_temperature(calib: &CalibrationTable, raw_value: u32) -> i64 {
    let adc = i64::from(raw_value);
    let t1 = i64::from(calib.dig_t1);
    let v1 = (((adc >> 3) - (t1 << 1)) * i64::from(calib.dig_t2)) >> 11;
    let v2 = (((((adc >> 4) - t1) * ((adc >> 4) - t1)) >> 12) * i64::from(calib.dig_t3)) >> 14;
    v1 + v2
}

/// °C with 0.01 resolution.
pub fn compute_temperature(t_fine: i64) -> f64 {
    ((t_fine * 5 + 128) >> 8) as f64 / 100.0
}

/// hPa. Returns exactly 0 when the divisor term vanishes.
pub fn compute_pressure(calib: &CalibrationTable, raw_value: u32, t_fine: i64) -> f64 {
    let mut v1 = t_fine as f64 / 2.0 - 64000.0;
    let mut v2 = v1 * v1 * f64::from(calib.dig_p6) / 32768.0;
    v2 += v1 * f64::from(calib.dig_p5) * 2.0;
    v2 = v2 / 4.0 + f64::from(calib.dig_p4) * 65536.0;
    v1 = (f64::from(calib.dig_p3) * v1 * v1 / 524288.0 + f64::from(calib.dig_p2) * v1) / 524288.0;
    v1 = (1.0 + v1 / 32768.0) * f64::from(calib.dig_p1);
    if v1 == 0.0 {
        return 0.0;
    }
    let mut pressure = 1048576.0 - f64::from(raw_value);
    pressure = ((pressure - v2 / 4096.0) * 6250.0) / v1;
    v1 = f64::from(calib.dig_p9) * pressure * pressure / 2147483648.0;
    v2 = pressure * f64::from(calib.dig_p8) / 32768.0;
    pressure += (v1 + v2 + f64::from(calib.dig_p7)) / 16.0;
    pressure / 100.0
}

/// %RH, clipped to 0..=100.
pub fn compute_humidity(calib: &CalibrationTable, raw_value: u16, t_fine: i64) -> f64 {
    let mut h = t_fine as f64 - 76800.0;
    h = (f64::from(raw_value) - (f64::from(calib.dig_h4) * 64.0 + f64::from(calib.dig_h5) / 16384.0 * h))
        * (f64::from(calib.dig_h2) / 65536.0
            * (1.0 + f64::from(calib.dig_h6) / 67108864.0 * h * (1.0 + f64::from(calib.dig_h3) / 67108864.0 * h)));
    h *= 1.0 - f64::from(calib.dig_h1) * h / 524288.0;
    h.clamp(0.0, 100.0)
}

pub fn compensate(calib: &CalibrationTable, raw: &RawSample) -> CalibratedReading {
    let t_fine = fine_temperature(calib, raw.temperature);
    CalibratedReading {
        temperature: compute_temperature(t_fine),
        pressure: compute_pressure(calib, raw.pressure, t_fine),
        humidity: compute_humidity(calib, raw.humidity, t_fine),
    }
}

/// Rough dewpoint estimate, °C.
pub fn dewpoint(temperature: f64, humidity: f64) -> f64 {
    temperature - ((100.0 - humidity) / 5.0)
}

/// Linear sea-level correction, hPa. Not a barometric formula.
pub fn adjusted_pressure(pressure: f64, height_at_location: f64) -> f64 {
    pressure + height_at_location / 8.3
}

/// Metres above the level where `sea_level_pressure` is measured.
pub fn altitude(pressure: f64, sea_level_pressure: f64) -> f64 {
    44330.0 * (1.0 - (pressure / sea_level_pressure).powf(1.0 / 5.255))
}
