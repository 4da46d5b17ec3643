// config.rs

use std::env;

use anyhow::bail;
use log::*;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

const DEFAULT_API_PORT: u16 = 5000;
const DEFAULT_PUSH_INTERVAL_MS: u64 = 1000;
const DEFAULT_POLL_MS: u64 = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyConfig {
    pub port: u16,
    pub push_interval_ms: u64,
    pub poll_ms: u64,
    pub title: String,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            port: option_env!("API_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_API_PORT),
            push_interval_ms: option_env!("PUSH_INTERVAL_MS")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_PUSH_INTERVAL_MS),
            poll_ms: option_env!("POLL_MS")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_POLL_MS),
            title: "Dashboard".into(),
        }
    }
}

impl MyConfig {
    /// Build-time defaults, overridden by the same variables in the runtime environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply(|key| env::var(key).ok())?;
        Ok(config)
    }

    fn apply<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("API_PORT") {
            self.port = match v.parse() {
                Ok(p) => p,
                Err(e) => bail!("API_PORT {v:?}: {e}"),
            };
            info!("Port overridden from environment: {}", self.port);
        }
        if let Some(v) = lookup("PUSH_INTERVAL_MS") {
            self.push_interval_ms = match v.parse() {
                Ok(p) => p,
                Err(e) => bail!("PUSH_INTERVAL_MS {v:?}: {e}"),
            };
            info!("Push interval overridden from environment: {} ms", self.push_interval_ms);
        }
        if let Some(v) = lookup("POLL_MS") {
            self.poll_ms = match v.parse() {
                Ok(p) => p,
                Err(e) => bail!("POLL_MS {v:?}: {e}"),
            };
            info!("Poll quantum overridden from environment: {} ms", self.poll_ms);
        }
        if let Some(v) = lookup("DASHBOARD_TITLE") {
            self.title = v;
        }
        self.validate()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.push_interval_ms == 0 {
            bail!("Push interval must be positive");
        }
        if self.poll_ms == 0 {
            bail!("Poll quantum must be positive");
        }
        if self.poll_ms > self.push_interval_ms {
            bail!(
                "Poll quantum {} ms is longer than push interval {} ms",
                self.poll_ms,
                self.push_interval_ms
            );
        }
        Ok(())
    }

    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }

    pub fn poll_quantum(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let c = MyConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.title, "Dashboard");
    }

    #[test]
    fn environment_overrides_defaults() {
        let mut c = MyConfig::default();
        c.apply(lookup(&[("API_PORT", "8080"), ("PUSH_INTERVAL_MS", "2000"), ("POLL_MS", "20")]))
            .unwrap();
        assert_eq!(c.port, 8080);
        assert_eq!(c.push_interval(), Duration::from_secs(2));
        assert_eq!(c.poll_quantum(), Duration::from_millis(20));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut c = MyConfig::default();
        assert!(c.apply(lookup(&[("API_PORT", "http")])).is_err());

        let mut c = MyConfig::default();
        assert!(c.apply(lookup(&[("PUSH_INTERVAL_MS", "0")])).is_err());

        let mut c = MyConfig::default();
        assert!(c
            .apply(lookup(&[("PUSH_INTERVAL_MS", "100"), ("POLL_MS", "500")]))
            .is_err());
    }
}

// EOF
