//! Runtime configuration, read once at startup.
//!
//! Every key is optional. A value of the wrong shape is reported and the
//! default for that key is kept, so a partly broken file still yields a
//! usable configuration.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vscp {
    /// Explicit node GUID. Empty means derive it from the interface MAC.
    pub guid: String,
    pub interface: String,
    pub zone: u8,
    pub subzone: u8,
    pub apply_suffix_to_explicit_guid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mqtt {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub client_id: String,
    pub topic: String,
}

/// Post-processing constants of one pressure sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Barometer {
    /// hPa
    pub sea_level_pressure: f64,
    /// Subtracted from the reported temperature.
    pub temp_corr: f64,
    /// m
    pub height_at_location: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bme680 {
    pub barometer: Barometer,
    pub gas_enabled: bool,
    /// °C
    pub heater_temperature: u16,
    pub heater_duration: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub sensorindex: u8,
    /// Two least significant GUID bytes.
    pub id: u16,
    pub note: Option<String>,
    pub qos: u8,
}

impl Measurement {
    fn new(index: u8, qos: u8) -> Self {
        Measurement {
            sensorindex: index,
            id: u16::from(index),
            note: None,
            qos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurements {
    pub temperature: Measurement,
    pub humidity: Measurement,
    pub pressure: Measurement,
    pub pressure_adj: Measurement,
    pub altitude: Measurement,
    pub dewpoint: Measurement,
    pub gas: Measurement,
}

impl Measurements {
    fn entries_mut(&mut self) -> [(&'static str, &mut Measurement); 7] {
        [
            ("temperature", &mut self.temperature),
            ("humidity", &mut self.humidity),
            ("pressure", &mut self.pressure),
            ("pressure_adj", &mut self.pressure_adj),
            ("altitude", &mut self.altitude),
            ("dewpoint", &mut self.dewpoint),
            ("gas", &mut self.gas),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub logger: Logger,
    pub vscp: Vscp,
    pub mqtt: Mqtt,
    pub bme280: Barometer,
    pub bme680: Bme680,
    pub measurement: Measurements,
}

impl Default for Barometer {
    fn default() -> Self {
        Barometer {
            sea_level_pressure: 1013.25,
            temp_corr: 0.0,
            height_at_location: 0.0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            logger: Logger { level: "info".into() },
            vscp: Vscp {
                guid: String::new(),
                interface: "eth0".into(),
                zone: 0,
                subzone: 0,
                apply_suffix_to_explicit_guid: false,
            },
            mqtt: Mqtt {
                host: "192.168.1.7".into(),
                port: 1883,
                user: "vscp".into(),
                password: "secret".into(),
                client_id: "rpvscp".into(),
                topic: "vscp/{xguid}/{xclass}/{xtype}/{xsensorindex}".into(),
            },
            bme280: Barometer::default(),
            bme680: Bme680 {
                barometer: Barometer::default(),
                gas_enabled: false,
                heater_temperature: 320,
                heater_duration: 150,
            },
            measurement: Measurements {
                temperature: Measurement::new(0, 0),
                humidity: Measurement::new(1, 0),
                pressure: Measurement::new(2, 1),
                pressure_adj: Measurement::new(3, 0),
                altitude: Measurement::new(4, 0),
                dewpoint: Measurement::new(5, 0),
                gas: Measurement::new(6, 0),
            },
        }
    }
}

impl Settings {
    /// Load `path`, or `configs/default.toml` when it exists, or the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_PATH)),
            None => Ok(Settings::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let settings = Self::from_toml(&text)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let table = toml::from_str::<Table>(text).map_err(|e| Error::Config(e.to_string()))?;
        let mut settings = Settings::default();

        if let Some(section) = subtable(&table, "logger") {
            overlay(section, "logger", "level", &mut settings.logger.level);
        }

        if let Some(section) = subtable(&table, "vscp") {
            let vscp = &mut settings.vscp;
            overlay(section, "vscp", "guid", &mut vscp.guid);
            overlay(section, "vscp", "interface", &mut vscp.interface);
            overlay(section, "vscp", "zone", &mut vscp.zone);
            overlay(section, "vscp", "subzone", &mut vscp.subzone);
            overlay(
                section,
                "vscp",
                "apply_suffix_to_explicit_guid",
                &mut vscp.apply_suffix_to_explicit_guid,
            );
        }

        if let Some(section) = subtable(&table, "mqtt") {
            let mqtt = &mut settings.mqtt;
            overlay(section, "mqtt", "host", &mut mqtt.host);
            overlay(section, "mqtt", "port", &mut mqtt.port);
            overlay(section, "mqtt", "user", &mut mqtt.user);
            overlay(section, "mqtt", "password", &mut mqtt.password);
            overlay(section, "mqtt", "client_id", &mut mqtt.client_id);
            overlay(section, "mqtt", "topic", &mut mqtt.topic);
        }

        if let Some(section) = subtable(&table, "bme280") {
            overlay_barometer(section, "bme280", &mut settings.bme280);
        }

        if let Some(section) = subtable(&table, "bme680") {
            let bme680 = &mut settings.bme680;
            overlay_barometer(section, "bme680", &mut bme680.barometer);
            overlay(section, "bme680", "gas_enabled", &mut bme680.gas_enabled);
            overlay(section, "bme680", "heater_temperature", &mut bme680.heater_temperature);
            overlay(section, "bme680", "heater_duration", &mut bme680.heater_duration);
        }

        if let Some(measurements) = subtable(&table, "measurement") {
            for (name, measurement) in settings.measurement.entries_mut() {
                let Some(section) = subtable(measurements, name) else {
                    continue;
                };
                let path = format!("measurement.{}", name);
                overlay(section, &path, "sensorindex", &mut measurement.sensorindex);
                overlay(section, &path, "id", &mut measurement.id);
                let mut note = String::new();
                if overlay(section, &path, "note", &mut note) {
                    measurement.note = Some(note);
                }
                let mut qos = measurement.qos;
                if overlay(section, &path, "qos", &mut qos) {
                    if qos <= 2 {
                        measurement.qos = qos;
                    } else {
                        tracing::warn!("ignoring {}.qos = {}: must be 0, 1 or 2", path, qos);
                    }
                }
            }
        }

        Ok(settings)
    }
}

fn subtable<'a>(table: &'a Table, name: &str) -> Option<&'a Table> {
    match table.get(name) {
        Some(Value::Table(section)) => Some(section),
        Some(other) => {
            tracing::warn!("ignoring [{}]: expected a table, found {}", name, other.type_str());
            None
        }
        None => None,
    }
}

/// Replace `target` with `section[key]` when present and well formed.
/// Returns whether `target` was replaced.
fn overlay<T: DeserializeOwned>(section: &Table, path: &str, key: &str, target: &mut T) -> bool {
    let Some(value) = section.get(key) else {
        return false;
    };
    match value.clone().try_into::<T>() {
        Ok(parsed) => {
            *target = parsed;
            true
        }
        Err(e) => {
            tracing::warn!("ignoring {}.{} = {}: {}", path, key, value, e);
            false
        }
    }
}

fn overlay_barometer(section: &Table, path: &str, barometer: &mut Barometer) {
    overlay(section, path, "sea_level_pressure", &mut barometer.sea_level_pressure);
    overlay(section, path, "temp_corr", &mut barometer.temp_corr);
    overlay(section, path, "height_at_location", &mut barometer.height_at_location);
}
