use std::io;

use rppal::i2c::I2c;

use crate::error::{Error, Result};

/// Rev 2 Pi, Pi 2 and later expose the header I2C pins on bus 1.
pub const DEFAULT_BUS: u8 = 1;

/// Register level access to one I2C slave.
pub trait RegisterBus {
    /// Read `buffer.len()` consecutive registers starting at `register`.
    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<()>;

    fn write_register(&mut self, register: u8, value: u8) -> Result<()>;

    /// Send a bare command byte (no register address).
    fn write_command(&mut self, command: u8) -> Result<()>;

    /// Plain read without a preceding register address.
    fn read_raw(&mut self, buffer: &mut [u8]) -> Result<()>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<()> {
        (**self).read_registers(register, buffer)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
        (**self).write_register(register, value)
    }

    fn write_command(&mut self, command: u8) -> Result<()> {
        (**self).write_command(command)
    }

    fn read_raw(&mut self, buffer: &mut [u8]) -> Result<()> {
        (**self).read_raw(buffer)
    }
}

pub fn open(bus: u8, address: u16) -> Result<I2c> {
    let mut i2c = I2c::with_bus(bus)?;
    i2c.set_slave_address(address)?;
    tracing::debug!("opened I2C bus {} at address 0x{:02x}", bus, address);
    Ok(i2c)
}

impl RegisterBus for I2c {
    fn read_registers(&mut self, register: u8, buffer: &mut [u8]) -> Result<()> {
        for (n, byte) in buffer.iter_mut().enumerate() {
            *byte = self.smbus_read_byte(register.wrapping_add(n as u8))?;
        }
        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
        self.smbus_write_byte(register, value)?;
        Ok(())
    }

    fn write_command(&mut self, command: u8) -> Result<()> {
        self.write(&[command])?;
        Ok(())
    }

    fn read_raw(&mut self, buffer: &mut [u8]) -> Result<()> {
        let read = self.read(buffer)?;
        if read != buffer.len() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short I2C read: {} of {} bytes", read, buffer.len()),
            )));
        }
        Ok(())
    }
}
