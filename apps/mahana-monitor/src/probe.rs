use crate::sample::Temperature;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Seam between the poll loop and whatever hardware provides readings.
pub trait TemperatureProbe: Send + Sync {
    fn read(&self) -> Result<Temperature>;
}

/// Reads a Linux thermal zone sysfs file (integer millidegrees Celsius).
pub struct ThermalZoneProbe {
    path: PathBuf,
}

impl ThermalZoneProbe {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TemperatureProbe for ThermalZoneProbe {
    fn read(&self) -> Result<Temperature> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let millidegrees: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("unexpected thermal zone value {:?}", raw.trim()))?;
        Ok(Temperature::from_celsius(millidegrees as f64 / 1000.0))
    }
}
