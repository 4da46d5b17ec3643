// measure.rs

use std::fmt;

use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::*;

use crate::{Lps22, Sht4x};

/// Synchronous access to the environmental sensors.
///
/// Every call may start a fresh bus transaction; nothing is cached.
pub trait Sensors {
    fn temperature_c(&mut self) -> anyhow::Result<f32>;
    fn relative_humidity(&mut self) -> anyhow::Result<f32>;
    fn pressure_hpa(&mut self) -> anyhow::Result<f32>;

    fn temperature_f(&mut self) -> anyhow::Result<f32> {
        Ok(celsius_to_fahrenheit(self.temperature_c()?))
    }
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

// Besides bus errors, a sensor can answer with garbage or not be the chip we expect.
// Therefore we extend the bus error cases for proper error handling.
#[derive(Debug, thiserror::Error)]
pub enum SensorError<E: fmt::Debug> {
    #[error("I2C bus error: {0:?}")]
    I2c(E),
    #[error("CRC mismatch in sensor response")]
    Crc,
    #[error("unexpected chip id {0:#04x}")]
    ChipId(u8),
}

impl<E: fmt::Debug> From<E> for SensorError<E> {
    fn from(value: E) -> Self {
        SensorError::I2c(value)
    }
}

/// SHT4x and LPS22 sharing one I2C bus.
pub struct Board<I2C, D> {
    i2c: I2C,
    delay: D,
    sht: Sht4x,
    lps: Lps22,
}

impl<I2C, D> Board<I2C, D>
where
    I2C: I2c,
    I2C::Error: Send + Sync + 'static,
    D: DelayNs,
{
    pub fn new(mut i2c: I2C, mut delay: D) -> anyhow::Result<Self> {
        let sht = Sht4x::new();
        let serial = sht.serial_number(&mut i2c, &mut delay)?;
        info!("SHT4x found, serial {serial:#010x}");

        let lps = Lps22::new();
        lps.init(&mut i2c, &mut delay)?;
        info!("LPS22 initialized");

        Ok(Board {
            i2c,
            delay,
            sht,
            lps,
        })
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> Sensors for Board<I2C, D>
where
    I2C: I2c,
    I2C::Error: Send + Sync + 'static,
    D: DelayNs,
{
    fn temperature_c(&mut self) -> anyhow::Result<f32> {
        Ok(self.sht.measure(&mut self.i2c, &mut self.delay)?.temperature)
    }

    fn relative_humidity(&mut self) -> anyhow::Result<f32> {
        Ok(self
            .sht
            .measure(&mut self.i2c, &mut self.delay)?
            .relative_humidity)
    }

    fn pressure_hpa(&mut self) -> anyhow::Result<f32> {
        Ok(self.lps.pressure(&mut self.i2c)?)
    }
}

#[cfg(test)]
pub(crate) mod testbus {
    use std::collections::VecDeque;

    use embedded_hal::{
        delay::DelayNs,
        i2c::{self, ErrorKind, ErrorType, I2c, Operation, SevenBitAddress},
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BusError;

    impl i2c::Error for BusError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Fake bus: records writes, answers reads from a queue, can be told to fail.
    #[derive(Default)]
    pub struct FakeBus {
        pub writes: Vec<(u8, Vec<u8>)>,
        pub replies: VecDeque<Vec<u8>>,
        pub fail: bool,
    }

    impl FakeBus {
        pub fn reply(&mut self, bytes: &[u8]) {
            self.replies.push_back(bytes.to_vec());
        }
    }

    impl ErrorType for FakeBus {
        type Error = BusError;
    }

    impl I2c<SevenBitAddress> for FakeBus {
        fn transaction(
            &mut self,
            address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(BusError);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        let reply = self.replies.pop_front().ok_or(BusError)?;
                        buf.copy_from_slice(&reply[..buf.len()]);
                    }
                }
            }
            Ok(())
        }
    }

    pub struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }
}

#[cfg(test)]
mod tests {
    use super::testbus::*;
    use super::*;
    use crate::sht4x::crc8;

    struct Fixed(f32);

    impl Sensors for Fixed {
        fn temperature_c(&mut self) -> anyhow::Result<f32> {
            Ok(self.0)
        }
        fn relative_humidity(&mut self) -> anyhow::Result<f32> {
            Ok(0.0)
        }
        fn pressure_hpa(&mut self) -> anyhow::Result<f32> {
            Ok(0.0)
        }
    }

    fn sht_word(w: u16) -> [u8; 3] {
        let b = w.to_be_bytes();
        [b[0], b[1], crc8(&b)]
    }

    #[test]
    fn fahrenheit_is_derived_from_celsius() {
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
        assert_eq!(Fixed(20.0).temperature_f().unwrap(), 68.0);
    }

    #[test]
    fn board_checks_both_chips_and_reads() {
        let mut bus = FakeBus::default();
        // serial number
        let mut serial = sht_word(0x1234).to_vec();
        serial.extend_from_slice(&sht_word(0x5678));
        bus.reply(&serial);
        // WHO_AM_I
        bus.reply(&[0xB3]);
        // CTRL_REG2 after reset: boot done
        bus.reply(&[0x10]);

        let mut board = Board::new(bus, NoDelay).unwrap();

        // pressure 1013.25 hPa = 4150272 counts
        let raw = 4150272u32.to_le_bytes();
        board.i2c.reply(&raw[..3]);
        let p = board.pressure_hpa().unwrap();
        assert!((p - 1013.25).abs() < 0.001);

        let (bus, _) = board.release();
        assert_eq!(bus.writes[0], (0x44, vec![0x89]));
    }

    #[test]
    fn board_fails_on_wrong_pressure_chip() {
        let mut bus = FakeBus::default();
        let mut serial = sht_word(1).to_vec();
        serial.extend_from_slice(&sht_word(2));
        bus.reply(&serial);
        bus.reply(&[0xB1]);
        assert!(Board::new(bus, NoDelay).is_err());
    }
}

// EOF
