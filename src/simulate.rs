// simulate.rs

use std::f32::consts::TAU;

use tokio::time::Instant;

use crate::Sensors;

const TEMP_BASE: f32 = 21.5;
const TEMP_SWING: f32 = 1.5;
const HUMID_BASE: f32 = 45.0;
const HUMID_SWING: f32 = 6.0;
const PRESS_BASE: f32 = 1013.2;
const PRESS_SWING: f32 = 2.5;
// one full swing every ten minutes
const PERIOD_S: f32 = 600.0;

/// Stand-in for the sensor board on hosts without an I2C bus.
/// Values drift smoothly with time and never fail.
pub struct SimulatedSensors {
    started: Instant,
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensors {
    pub fn new() -> Self {
        SimulatedSensors {
            started: Instant::now(),
        }
    }

    fn phase(&self) -> f32 {
        self.started.elapsed().as_secs_f32() / PERIOD_S * TAU
    }
}

pub fn simulated_temperature(phase: f32) -> f32 {
    TEMP_BASE + TEMP_SWING * phase.sin()
}

pub fn simulated_humidity(phase: f32) -> f32 {
    // humidity falls as the room warms up
    HUMID_BASE - HUMID_SWING * phase.sin()
}

pub fn simulated_pressure(phase: f32) -> f32 {
    PRESS_BASE + PRESS_SWING * (phase / 3.0).cos()
}

impl Sensors for SimulatedSensors {
    fn temperature_c(&mut self) -> anyhow::Result<f32> {
        Ok(simulated_temperature(self.phase()))
    }

    fn relative_humidity(&mut self) -> anyhow::Result<f32> {
        Ok(simulated_humidity(self.phase()))
    }

    fn pressure_hpa(&mut self) -> anyhow::Result<f32> {
        Ok(simulated_pressure(self.phase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_plausible_ranges() {
        for i in 0..100 {
            let phase = i as f32 / 10.0;
            let t = simulated_temperature(phase);
            let h = simulated_humidity(phase);
            let p = simulated_pressure(phase);
            assert!((19.0..=24.0).contains(&t), "temperature {t}");
            assert!((38.0..=52.0).contains(&h), "humidity {h}");
            assert!((1010.0..=1016.0).contains(&p), "pressure {p}");
        }
    }

    #[test]
    fn simulated_board_answers_every_metric() {
        let mut s = SimulatedSensors::new();
        let c = s.temperature_c().unwrap();
        let f = s.temperature_f().unwrap();
        assert!((f - (c * 9.0 / 5.0 + 32.0)).abs() < 0.1);
        assert!(s.relative_humidity().is_ok());
        assert!(s.pressure_hpa().is_ok());
    }
}

// EOF
