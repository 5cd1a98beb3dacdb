use crate::error::{Error, Result};

pub const BMP280_CHIP_ID: u8 = 0x58;
pub const BME280_CHIP_ID: u8 = 0x60;
pub const BME680_CHIP_ID: u8 = 0x61;

/// Trimming coefficients of a BME280-class chip, read once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationTable {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

/// One burst read of the ADC registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub pressure: u32,
    pub temperature: u32,
    pub humidity: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedReading {
    /// °C
    pub temperature: f64,
    /// hPa
    pub pressure: f64,
    /// %RH, clamped to 0..=100
    pub humidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipVariant {
    Bme280Full,
    Bmp280PressureOnly,
    Bme680WithGas,
}

impl ChipVariant {
    pub fn from_chip_id(chip_id: u8) -> Result<Self> {
        match chip_id {
            BME280_CHIP_ID => Ok(ChipVariant::Bme280Full),
            BMP280_CHIP_ID => Ok(ChipVariant::Bmp280PressureOnly),
            BME680_CHIP_ID => Ok(ChipVariant::Bme680WithGas),
            other => Err(Error::UnsupportedChip(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChipVariant::Bme280Full => "BME280",
            ChipVariant::Bmp280PressureOnly => "BMP280",
            ChipVariant::Bme680WithGas => "BME680",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipIdentity {
    pub chip_id: u8,
    pub version: u8,
    pub variant: ChipVariant,
}

/// A calibrated measurement, tagged with what the chip is able to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Bme280Full(CalibratedReading),
    Bmp280PressureOnly { temperature: f64, pressure: f64 },
    Bme680WithGas {
        reading: CalibratedReading,
        /// Ω, present only when the heater cycle produced a valid sample
        gas_resistance: Option<f64>,
    },
}

impl Reading {
    pub fn temperature(&self) -> f64 {
        match self {
            Reading::Bme280Full(r) => r.temperature,
            Reading::Bmp280PressureOnly { temperature, .. } => *temperature,
            Reading::Bme680WithGas { reading, .. } => reading.temperature,
        }
    }

    pub fn pressure(&self) -> f64 {
        match self {
            Reading::Bme280Full(r) => r.pressure,
            Reading::Bmp280PressureOnly { pressure, .. } => *pressure,
            Reading::Bme680WithGas { reading, .. } => reading.pressure,
        }
    }

    pub fn humidity(&self) -> Option<f64> {
        match self {
            Reading::Bme280Full(r) => Some(r.humidity),
            Reading::Bmp280PressureOnly { .. } => None,
            Reading::Bme680WithGas { reading, .. } => Some(reading.humidity),
        }
    }

    pub fn gas_resistance(&self) -> Option<f64> {
        match self {
            Reading::Bme680WithGas { gas_resistance, .. } => *gas_resistance,
            _ => None,
        }
    }
}
