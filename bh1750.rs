use std::thread;
use std::time::Duration;

use crate::bus::RegisterBus;
use crate::error::Result;

pub const DEFAULT_ADDRESS: u16 = 0x23;

const POWER_ON: u8 = 0x01;
const CONTINUOUS_HIGH_RES_MODE_2: u8 = 0x11;
/// Worst case conversion time in high resolution mode.
const MEASUREMENT_TIME: Duration = Duration::from_millis(180);

/// lux from the two result bytes, msb first.
pub fn lux_from_raw(data: [u8; 2]) -> f64 {
    (f64::from(data[1]) + 256.0 * f64::from(data[0])) / 1.2
}

pub struct Bh1750<B> {
    bus: B,
}

impl<B: RegisterBus> Bh1750<B> {
    pub fn new(mut bus: B) -> Result<Self> {
        bus.write_command(POWER_ON)?;
        Ok(Bh1750 { bus })
    }

    pub fn read_lux(&mut self) -> Result<f64> {
        self.bus.write_command(CONTINUOUS_HIGH_RES_MODE_2)?;
        thread::sleep(MEASUREMENT_TIME);
        let mut data = [0u8; 2];
        self.bus.read_raw(&mut data)?;
        let lux = lux_from_raw(data);
        tracing::debug!("BH1750 raw {:02x}{:02x}: {:.2} lx", data[0], data[1], lux);
        Ok(lux)
    }
}
