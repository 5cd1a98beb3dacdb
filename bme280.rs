use std::thread;
use std::time::Duration;

use crate::bus::RegisterBus;
use crate::compensation::{self, CALIB_00_LEN, CALIB_26_LEN};
use crate::error::{Error, Result};
use crate::registers::{adc16_at, adc20_at};
use crate::structs::{CalibrationTable, ChipIdentity, ChipVariant, RawSample, Reading};

// BME280 I2C default slave address.
pub const DEFAULT_ADDRESS: u16 = 0x76;

// BME280 register addresses.
pub const REG_ID: u8 = 0xD0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CALIB_00: u8 = 0x88;
const REG_CALIB_24: u8 = 0xA1;
const REG_CALIB_26: u8 = 0xE1;
const REG_ADC_VALUE: u8 = 0xF7;
const REG_ADC_VALUE_LEN: usize = 8;

const OVERSAMPLE_TEMP: u8 = 2;
const OVERSAMPLE_PRES: u8 = 2;
const OVERSAMPLE_HUM: u8 = 2;
const MODE_FORCED: u8 = 1;

/// Chip id and version, read from 0xD0.
pub fn read_identity<B: RegisterBus>(bus: &mut B) -> Result<ChipIdentity> {
    let mut id = [0u8; 2];
    bus.read_registers(REG_ID, &mut id)?;
    let variant = ChipVariant::from_chip_id(id[0])?;
    Ok(ChipIdentity {
        chip_id: id[0],
        version: id[1],
        variant,
    })
}

/// Measurement time in ms, datasheet appendix B.
fn measurement_wait_ms() -> f64 {
    1.25 + (2.3 * f64::from(OVERSAMPLE_TEMP))
        + ((2.3 * f64::from(OVERSAMPLE_PRES)) + 0.575)
        + ((2.3 * f64::from(OVERSAMPLE_HUM)) + 0.575)
}

/// A BME280 or BMP280 with its calibration table loaded.
pub struct Bme280<B> {
    bus: B,
    identity: ChipIdentity,
    calibration: CalibrationTable,
}

impl<B: RegisterBus> Bme280<B> {
    pub fn new(mut bus: B) -> Result<Self> {
        let identity = read_identity(&mut bus)?;
        if identity.variant == ChipVariant::Bme680WithGas {
            return Err(Error::UnsupportedChip(identity.chip_id));
        }
        let calibration = read_calibration(&mut bus)?;
        tracing::debug!(
            "{} chip id 0x{:02x} version {}: {:?}",
            identity.variant.name(),
            identity.chip_id,
            identity.version,
            calibration
        );

        Ok(Bme280 {
            bus,
            identity,
            calibration,
        })
    }

    pub fn identity(&self) -> ChipIdentity {
        self.identity
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    /// Trigger one forced-mode conversion and burst-read the ADC registers.
    pub fn read_raw(&mut self) -> Result<RawSample> {
        self.bus.write_register(REG_CTRL_HUM, OVERSAMPLE_HUM)?;
        self.bus
            .write_register(REG_CTRL_MEAS, (OVERSAMPLE_TEMP << 5) | (OVERSAMPLE_PRES << 2) | MODE_FORCED)?;

        thread::sleep(Duration::from_micros((measurement_wait_ms() * 1000.0) as u64));

        let mut data = [0u8; REG_ADC_VALUE_LEN];
        self.bus.read_registers(REG_ADC_VALUE, &mut data)?;
        Ok(RawSample {
            pressure: adc20_at(&data, 0),
            temperature: adc20_at(&data, 3),
            humidity: adc16_at(&data, 6),
        })
    }

    pub fn read(&mut self) -> Result<Reading> {
        let raw = self.read_raw()?;
        let reading = compensation::compensate(&self.calibration, &raw);
        Ok(match self.identity.variant {
            ChipVariant::Bmp280PressureOnly => Reading::Bmp280PressureOnly {
                temperature: reading.temperature,
                pressure: reading.pressure,
            },
            _ => Reading::Bme280Full(reading),
        })
    }
}

fn read_calibration<B: RegisterBus>(bus: &mut B) -> Result<CalibrationTable> {
    let mut cal1 = [0u8; CALIB_00_LEN];
    let mut cal2 = [0u8; 1];
    let mut cal3 = [0u8; CALIB_26_LEN];
    // 0x88 - 0x9F
    bus.read_registers(REG_CALIB_00, &mut cal1)?;
    // 0xA1
    bus.read_registers(REG_CALIB_24, &mut cal2)?;
    // 0xE1 - 0xE7
    bus.read_registers(REG_CALIB_26, &mut cal3)?;
    Ok(CalibrationTable::from_blocks(&cal1, cal2[0], &cal3))
}
