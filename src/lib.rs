// lib.rs

pub use std::{
    net,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

pub use anyhow::bail;
pub use log::*;
pub use serde::{Deserialize, Serialize};
pub use tokio::{
    sync::Mutex,
    time::{Duration, Instant, sleep},
};

mod config;
pub use config::*;

mod state;
pub use state::*;

mod measure;
pub use measure::*;

mod sht4x;
pub use sht4x::*;

mod lps22;
pub use lps22::*;

mod simulate;
pub use simulate::*;

mod channel;
pub use channel::*;

mod scheduler;
pub use scheduler::*;

mod poll;
pub use poll::*;

mod apiserver;
pub use apiserver::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One fresh sample of every metric. A sensor that failed to answer is `None`.
#[derive(Clone, Debug, Serialize)]
pub struct Readings {
    pub timestamp: i64,
    pub last_update: String,
    pub temperature_c: Option<f32>,
    pub relative_humidity: Option<f32>,
    pub pressure_hpa: Option<f32>,
    pub temperature_f: Option<f32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Uptime {
    pub uptime: u64,
    pub uptime_s: String,
}

impl Uptime {
    pub fn new(uptime: u64) -> Self {
        Uptime {
            uptime,
            uptime_s: uptime_text(uptime),
        }
    }
}

pub fn uptime_text(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{days}d {hours:02}:{mins:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_text_splits_days() {
        assert_eq!(uptime_text(0), "0d 00:00:00");
        assert_eq!(uptime_text(90061), "1d 01:01:01");
        assert_eq!(Uptime::new(59).uptime_s, "0d 00:00:59");
    }
}

// EOF
