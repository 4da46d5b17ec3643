// sht4x.rs

use crc::{Crc, CRC_8_NRSC_5};
use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::SensorError;

pub const SHT4X_ADDRESS: u8 = 0x44;

const CMD_MEASURE_HIGH_PRECISION: u8 = 0xFD;
const CMD_SERIAL_NUMBER: u8 = 0x89;
const MEASURE_DELAY_MS: u32 = 10;

// polynomial 0x31, init 0xff: the Sensirion CRC
const SENSIRION_CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

pub(crate) fn crc8(data: &[u8]) -> u8 {
    SENSIRION_CRC.checksum(data)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sht4xMeasurement {
    pub temperature: f32,
    pub relative_humidity: f32,
}

/// Sensirion SHT4x temperature and humidity sensor, high precision without heater.
#[derive(Clone, Copy, Debug)]
pub struct Sht4x {
    address: u8,
}

impl Default for Sht4x {
    fn default() -> Self {
        Self::new()
    }
}

impl Sht4x {
    pub fn new() -> Self {
        Sht4x {
            address: SHT4X_ADDRESS,
        }
    }

    pub fn serial_number<I2C, D>(&self, i2c: &mut I2C, delay: &mut D) -> Result<u32, SensorError<I2C::Error>>
    where
        I2C: I2c,
        D: DelayNs,
    {
        let [hi, lo] = self.command(i2c, delay, CMD_SERIAL_NUMBER)?;
        Ok(((hi as u32) << 16) | lo as u32)
    }

    /// One measurement; the SHT4x always returns temperature and humidity together.
    pub fn measure<I2C, D>(&self, i2c: &mut I2C, delay: &mut D) -> Result<Sht4xMeasurement, SensorError<I2C::Error>>
    where
        I2C: I2c,
        D: DelayNs,
    {
        let [t_raw, rh_raw] = self.command(i2c, delay, CMD_MEASURE_HIGH_PRECISION)?;
        Ok(Sht4xMeasurement {
            temperature: -45.0 + 175.0 * t_raw as f32 / 65535.0,
            relative_humidity: (-6.0 + 125.0 * rh_raw as f32 / 65535.0).clamp(0.0, 100.0),
        })
    }

    fn command<I2C, D>(&self, i2c: &mut I2C, delay: &mut D, cmd: u8) -> Result<[u16; 2], SensorError<I2C::Error>>
    where
        I2C: I2c,
        D: DelayNs,
    {
        i2c.write(self.address, &[cmd])?;
        delay.delay_ms(MEASURE_DELAY_MS);

        let mut buf = [0u8; 6];
        i2c.read(self.address, &mut buf)?;

        let mut words = [0u16; 2];
        for (word, chunk) in words.iter_mut().zip(buf.chunks_exact(3)) {
            if crc8(&chunk[..2]) != chunk[2] {
                return Err(SensorError::Crc);
            }
            *word = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        Ok(words)
    }
}


// EOF
