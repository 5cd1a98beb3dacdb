//! BME680 session and its floating point compensation.

use std::thread;
use std::time::Duration;

use crate::bme280::{read_identity, REG_ID};
use crate::bus::RegisterBus;
use crate::error::{Error, Result};
use crate::registers::{adc16_at, adc20_at, i16_at, i8_at, u16_at, u8_at};
use crate::structs::{CalibratedReading, ChipIdentity, ChipVariant, Reading};

pub const PRIMARY_ADDRESS: u16 = 0x76;
pub const SECONDARY_ADDRESS: u16 = 0x77;

const REG_RES_HEAT_VAL: u8 = 0x00;
const REG_RES_HEAT_RANGE: u8 = 0x02;
const REG_RANGE_SW_ERR: u8 = 0x04;
const REG_FIELD0: u8 = 0x1D;
const REG_RES_HEAT_0: u8 = 0x5A;
const REG_GAS_WAIT_0: u8 = 0x64;
const REG_CTRL_GAS_1: u8 = 0x71;
const REG_CTRL_HUM: u8 = 0x72;
const REG_CTRL_MEAS: u8 = 0x74;
const REG_CONFIG: u8 = 0x75;
const REG_COEFF1: u8 = 0x89;
const REG_COEFF2: u8 = 0xE1;
const REG_SOFT_RESET: u8 = 0xE0;

const SOFT_RESET_CMD: u8 = 0xB6;
pub const COEFF1_LEN: usize = 25;
pub const COEFF2_LEN: usize = 16;
const FIELD_LEN: usize = 15;

const OS_2X: u8 = 2;
const OS_4X: u8 = 3;
const OS_8X: u8 = 4;
const FILTER_SIZE_3: u8 = 2;
const MODE_FORCED: u8 = 1;
const RUN_GAS: u8 = 0x10;

const NEW_DATA: u8 = 0x80;
const GAS_VALID: u8 = 0x20;
const HEAT_STABLE: u8 = 0x10;

const POLL_ATTEMPTS: usize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const LOOKUP_K1_RANGE: [f64; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, -0.8, 0.0, 0.0, -0.2, -0.5, 0.0, -1.0, 0.0, 0.0,
];
const LOOKUP_K2_RANGE: [f64; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.1, 0.7, 0.0, -0.8, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bme680Calibration {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
    pub par_gh1: i8,
    pub par_gh2: i16,
    pub par_gh3: i8,
    pub res_heat_range: u8,
    pub res_heat_val: i8,
    pub range_sw_err: i8,
}

impl Bme680Calibration {
    /// `coeff1` is 0x89..0xA1, `coeff2` is 0xE1..0xF0; the last three
    /// arguments are the raw heater registers 0x02, 0x00 and 0x04.
    pub fn from_blocks(
        coeff1: &[u8; COEFF1_LEN],
        coeff2: &[u8; COEFF2_LEN],
        res_heat_range: u8,
        res_heat_val: u8,
        range_sw_err: u8,
    ) -> Self {
        let mut c = [0u8; COEFF1_LEN + COEFF2_LEN];
        c[..COEFF1_LEN].copy_from_slice(coeff1);
        c[COEFF1_LEN..].copy_from_slice(coeff2);

        Bme680Calibration {
            par_t1: u16_at(&c, 33),
            par_t2: i16_at(&c, 1),
            par_t3: i8_at(&c, 3),
            par_p1: u16_at(&c, 5),
            par_p2: i16_at(&c, 7),
            par_p3: i8_at(&c, 9),
            par_p4: i16_at(&c, 11),
            par_p5: i16_at(&c, 13),
            par_p7: i8_at(&c, 15),
            par_p6: i8_at(&c, 16),
            par_p8: i16_at(&c, 19),
            par_p9: i16_at(&c, 21),
            par_p10: u8_at(&c, 23),
            // h1 and h2 share the nibbles of 0xE2
            par_h1: (u16::from(c[27]) << 4) | u16::from(c[26] & 0x0F),
            par_h2: (u16::from(c[25]) << 4) | u16::from(c[26] >> 4),
            par_h3: i8_at(&c, 28),
            par_h4: i8_at(&c, 29),
            par_h5: i8_at(&c, 30),
            par_h6: u8_at(&c, 31),
            par_h7: i8_at(&c, 32),
            par_gh2: i16_at(&c, 35),
            par_gh1: i8_at(&c, 37),
            par_gh3: i8_at(&c, 38),
            res_heat_range: (res_heat_range & 0x30) >> 4,
            res_heat_val: res_heat_val as i8,
            range_sw_err: ((range_sw_err & 0xF0) as i8) / 16,
        }
    }
}

/// One field read at 0x1D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bme680RawSample {
    pub temperature: u32,
    pub pressure: u32,
    pub humidity: u16,
    pub gas_resistance: u16,
    pub gas_range: u8,
    pub gas_valid: bool,
    pub heat_stable: bool,
}

impl Bme680RawSample {
    pub fn from_field(field: &[u8; FIELD_LEN]) -> Self {
        Bme680RawSample {
            pressure: adc20_at(field, 2),
            temperature: adc20_at(field, 5),
            humidity: adc16_at(field, 8),
            gas_resistance: (u16::from(field[13]) << 2) | (u16::from(field[14]) >> 6),
            gas_range: field[14] & 0x0F,
            gas_valid: field[14] & GAS_VALID != 0,
            heat_stable: field[14] & HEAT_STABLE != 0,
        }
    }
}

pub fn fine_temperature(calib: &Bme680Calibration, raw_value: u32) -> f64 {
    let adc = f64::from(raw_value);
    let t1 = f64::from(calib.par_t1);
    let v1 = ((adc / 16384.0) - (t1 / 1024.0)) * f64::from(calib.par_t2);
    let v2 = ((adc / 131072.0) - (t1 / 8192.0)) * ((adc / 131072.0) - (t1 / 8192.0)) * (f64::from(calib.par_t3) * 16.0);
    v1 + v2
}

/// Pa. Returns 0 when the divisor term vanishes.
pub fn compute_pressure(calib: &Bme680Calibration, raw_value: u32, t_fine: f64) -> f64 {
    let mut v1 = (t_fine / 2.0) - 64000.0;
    let mut v2 = v1 * v1 * (f64::from(calib.par_p6) / 131072.0);
    v2 += v1 * f64::from(calib.par_p5) * 2.0;
    v2 = (v2 / 4.0) + (f64::from(calib.par_p4) * 65536.0);
    v1 = (((f64::from(calib.par_p3) * v1 * v1) / 16384.0) + (f64::from(calib.par_p2) * v1)) / 524288.0;
    v1 = (1.0 + (v1 / 32768.0)) * f64::from(calib.par_p1);
    if v1 == 0.0 {
        return 0.0;
    }
    let mut pressure = 1048576.0 - f64::from(raw_value);
    pressure = ((pressure - (v2 / 4096.0)) * 6250.0) / v1;
    v1 = (f64::from(calib.par_p9) * pressure * pressure) / 2147483648.0;
    v2 = pressure * (f64::from(calib.par_p8) / 32768.0);
    let v3 = (pressure / 256.0) * (pressure / 256.0) * (pressure / 256.0) * (f64::from(calib.par_p10) / 131072.0);
    pressure + (v1 + v2 + v3 + (f64::from(calib.par_p7) * 128.0)) / 16.0
}

/// %RH, clipped to 0..=100.
pub fn compute_humidity(calib: &Bme680Calibration, raw_value: u16, t_fine: f64) -> f64 {
    let temp_comp = t_fine / 5120.0;
    let v1 = f64::from(raw_value) - ((f64::from(calib.par_h1) * 16.0) + ((f64::from(calib.par_h3) / 2.0) * temp_comp));
    let v2 = v1
        * ((f64::from(calib.par_h2) / 262144.0)
            * (1.0
                + ((f64::from(calib.par_h4) / 16384.0) * temp_comp)
                + ((f64::from(calib.par_h5) / 1048576.0) * temp_comp * temp_comp)));
    let v3 = f64::from(calib.par_h6) / 16384.0;
    let v4 = f64::from(calib.par_h7) / 2097152.0;
    let humidity = v2 + ((v3 + (v4 * temp_comp)) * v2 * v2);
    humidity.clamp(0.0, 100.0)
}

/// Ω
pub fn compute_gas_resistance(calib: &Bme680Calibration, raw_value: u16, gas_range: u8) -> f64 {
    let range = usize::from(gas_range & 0x0F);
    let v1 = 1340.0 + 5.0 * f64::from(calib.range_sw_err);
    let v2 = v1 * (1.0 + LOOKUP_K1_RANGE[range] / 100.0);
    let v3 = 1.0 + (LOOKUP_K2_RANGE[range] / 100.0);
    1.0 / (v3 * 0.000000125 * f64::from(1u32 << range) * (((f64::from(raw_value) - 512.0) / v2) + 1.0))
}

/// Heater resistance register value for `target` °C at `ambient` °C.
pub fn heater_resistance(calib: &Bme680Calibration, target: u16, ambient: f64) -> u8 {
    let target = f64::from(target.min(400));
    let v1 = (f64::from(calib.par_gh1) / 16.0) + 49.0;
    let v2 = ((f64::from(calib.par_gh2) / 32768.0) * 0.0005) + 0.00235;
    let v3 = f64::from(calib.par_gh3) / 1024.0;
    let v4 = v1 * (1.0 + (v2 * target));
    let v5 = v4 + (v3 * ambient);
    let res = 3.4
        * ((v5
            * (4.0 / (4.0 + f64::from(calib.res_heat_range)))
            * (1.0 / (1.0 + (f64::from(calib.res_heat_val) * 0.002))))
            - 25.0);
    res.clamp(0.0, 255.0) as u8
}

/// Heater duration register value: 6-bit mantissa, 2-bit multiplier of 4.
pub fn heater_duration(duration_ms: u16) -> u8 {
    if duration_ms >= 0xFC0 {
        return 0xFF;
    }
    let mut duration = duration_ms;
    let mut factor = 0u8;
    while duration > 0x3F {
        duration /= 4;
        factor += 1;
    }
    duration as u8 + factor * 64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaterProfile {
    /// °C
    pub temperature: u16,
    pub duration_ms: u16,
}

impl Default for HeaterProfile {
    fn default() -> Self {
        HeaterProfile {
            temperature: 320,
            duration_ms: 150,
        }
    }
}

pub struct Bme680<B> {
    bus: B,
    identity: ChipIdentity,
    calibration: Bme680Calibration,
    heater: Option<HeaterProfile>,
    ambient: f64,
}

impl<B: RegisterBus> Bme680<B> {
    pub fn new(mut bus: B, heater: Option<HeaterProfile>) -> Result<Self> {
        let identity = read_identity(&mut bus)?;
        if identity.variant != ChipVariant::Bme680WithGas {
            return Err(Error::UnsupportedChip(identity.chip_id));
        }
        bus.write_register(REG_SOFT_RESET, SOFT_RESET_CMD)?;
        thread::sleep(Duration::from_millis(10));

        let calibration = read_calibration(&mut bus)?;
        tracing::debug!("BME680 at register 0x{:02x}: {:?}", REG_ID, calibration);

        bus.write_register(REG_CTRL_HUM, OS_2X)?;
        bus.write_register(REG_CONFIG, FILTER_SIZE_3 << 2)?;

        Ok(Bme680 {
            bus,
            identity,
            calibration,
            heater,
            ambient: 25.0,
        })
    }

    pub fn identity(&self) -> ChipIdentity {
        self.identity
    }

    pub fn calibration(&self) -> &Bme680Calibration {
        &self.calibration
    }

    pub fn read_raw(&mut self) -> Result<Bme680RawSample> {
        match self.heater {
            Some(profile) => {
                let res_heat = heater_resistance(&self.calibration, profile.temperature, self.ambient);
                self.bus.write_register(REG_RES_HEAT_0, res_heat)?;
                self.bus.write_register(REG_GAS_WAIT_0, heater_duration(profile.duration_ms))?;
                self.bus.write_register(REG_CTRL_GAS_1, RUN_GAS)?;
            }
            None => self.bus.write_register(REG_CTRL_GAS_1, 0)?,
        }
        self.bus.write_register(REG_CTRL_MEAS, (OS_8X << 5) | (OS_4X << 2) | MODE_FORCED)?;

        let mut field = [0u8; FIELD_LEN];
        for _ in 0..POLL_ATTEMPTS {
            thread::sleep(POLL_INTERVAL);
            self.bus.read_registers(REG_FIELD0, &mut field)?;
            if field[0] & NEW_DATA != 0 {
                return Ok(Bme680RawSample::from_field(&field));
            }
        }
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "BME680 conversion did not complete",
        )))
    }

    pub fn read(&mut self) -> Result<Reading> {
        let raw = self.read_raw()?;
        let t_fine = fine_temperature(&self.calibration, raw.temperature);
        let temperature = t_fine / 5120.0;
        self.ambient = temperature;

        let gas_resistance = if self.heater.is_some() && raw.gas_valid && raw.heat_stable {
            Some(compute_gas_resistance(&self.calibration, raw.gas_resistance, raw.gas_range))
        } else {
            None
        };

        Ok(Reading::Bme680WithGas {
            reading: CalibratedReading {
                temperature,
                pressure: compute_pressure(&self.calibration, raw.pressure, t_fine) / 100.0,
                humidity: compute_humidity(&self.calibration, raw.humidity, t_fine),
            },
            gas_resistance,
        })
    }
}

fn read_calibration<B: RegisterBus>(bus: &mut B) -> Result<Bme680Calibration> {
    let mut coeff1 = [0u8; COEFF1_LEN];
    let mut coeff2 = [0u8; COEFF2_LEN];
    let mut heat = [0u8; 1];
    bus.read_registers(REG_COEFF1, &mut coeff1)?;
    bus.read_registers(REG_COEFF2, &mut coeff2)?;

    bus.read_registers(REG_RES_HEAT_RANGE, &mut heat)?;
    let res_heat_range = heat[0];
    bus.read_registers(REG_RES_HEAT_VAL, &mut heat)?;
    let res_heat_val = heat[0];
    bus.read_registers(REG_RANGE_SW_ERR, &mut heat)?;
    let range_sw_err = heat[0];

    Ok(Bme680Calibration::from_blocks(
        &coeff1,
        &coeff2,
        res_heat_range,
        res_heat_val,
        range_sw_err,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heater_duration_encoding() {
        assert_eq!(heater_duration(63), 63);
        assert_eq!(heater_duration(150), 37 + 64);
        assert_eq!(heater_duration(0xFC0), 0xFF);
    }

    #[test]
    fn test_range_switching_error_is_signed() {
        let calib = Bme680Calibration::from_blocks(&[0; COEFF1_LEN], &[0; COEFF2_LEN], 0x30, 0xFE, 0xF0);
        assert_eq!(calib.res_heat_range, 3);
        assert_eq!(calib.res_heat_val, -2);
        assert_eq!(calib.range_sw_err, -1);
    }

    #[test]
    fn test_humidity_nibbles() {
        let mut coeff2 = [0u8; COEFF2_LEN];
        coeff2[0] = 0x3F; // 0xE1 h2 msb
        coeff2[1] = 0x5A; // 0xE2 h2 lsb nibble | h1 lsb nibble
        coeff2[2] = 0x2B; // 0xE3 h1 msb
        let calib = Bme680Calibration::from_blocks(&[0; COEFF1_LEN], &coeff2, 0, 0, 0);
        assert_eq!(calib.par_h1, (0x2B << 4) | 0x0A);
        assert_eq!(calib.par_h2, (0x3F << 4) | 0x05);
    }

    #[test]
    fn test_pressure_divisor_guard() {
        let calib = Bme680Calibration::default();
        assert_eq!(compute_pressure(&calib, 400000, 100000.0), 0.0);
    }
}
