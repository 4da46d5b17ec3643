// lps22.rs

use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::SensorError;

pub const LPS22_ADDRESS: u8 = 0x5D;

const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1: u8 = 0x10;
const REG_CTRL2: u8 = 0x11;
const REG_PRESS_OUT_XL: u8 = 0x28;
const REG_TEMP_OUT_L: u8 = 0x2B;

const CHIP_ID: u8 = 0xB3;
const CTRL2_SWRESET: u8 = 0x04;
// ODR 75 Hz, block data update
const CTRL1_RUN: u8 = (0x05 << 4) | 0x02;
const RESET_POLLS: usize = 10;

/// ST LPS22 barometer in continuous mode.
#[derive(Clone, Copy, Debug)]
pub struct Lps22 {
    address: u8,
}

impl Default for Lps22 {
    fn default() -> Self {
        Self::new()
    }
}

impl Lps22 {
    pub fn new() -> Self {
        Lps22 {
            address: LPS22_ADDRESS,
        }
    }

    pub fn init<I2C, D>(&self, i2c: &mut I2C, delay: &mut D) -> Result<(), SensorError<I2C::Error>>
    where
        I2C: I2c,
        D: DelayNs,
    {
        let id = self.read_reg(i2c, REG_WHO_AM_I)?;
        if id != CHIP_ID {
            return Err(SensorError::ChipId(id));
        }

        i2c.write(self.address, &[REG_CTRL2, CTRL2_SWRESET])?;
        for _ in 0..RESET_POLLS {
            delay.delay_ms(1);
            if self.read_reg(i2c, REG_CTRL2)? & CTRL2_SWRESET == 0 {
                break;
            }
        }

        i2c.write(self.address, &[REG_CTRL1, CTRL1_RUN])?;
        Ok(())
    }

    /// Pressure in hPa.
    pub fn pressure<I2C: I2c>(&self, i2c: &mut I2C) -> Result<f32, SensorError<I2C::Error>> {
        let mut buf = [0u8; 3];
        i2c.write_read(self.address, &[REG_PRESS_OUT_XL], &mut buf)?;
        Ok(pressure_from_raw(buf) / 4096.0)
    }

    /// Die temperature in °C.
    pub fn temperature<I2C: I2c>(&self, i2c: &mut I2C) -> Result<f32, SensorError<I2C::Error>> {
        let mut buf = [0u8; 2];
        i2c.write_read(self.address, &[REG_TEMP_OUT_L], &mut buf)?;
        Ok(i16::from_le_bytes(buf) as f32 / 100.0)
    }

    fn read_reg<I2C: I2c>(&self, i2c: &mut I2C, reg: u8) -> Result<u8, SensorError<I2C::Error>> {
        let mut buf = [0u8; 1];
        i2c.write_read(self.address, &[reg], &mut buf)?;
        Ok(buf[0])
    }
}

// 24-bit two's complement, little endian
fn pressure_from_raw(b: [u8; 3]) -> f32 {
    (i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8) as f32
}


// EOF
