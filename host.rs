//! Host statistics read from sysfs.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mac::MacAddress;

pub const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";
const NET_CLASS: &str = "/sys/class/net";

/// First line of the thermal zone file, in millidegrees.
pub fn read_cpu_temperature(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().next().unwrap_or_default().to_string())
}

pub fn interface_address_path(interface: &str) -> PathBuf {
    Path::new(NET_CLASS).join(interface).join("address")
}

/// Hardware address of a network interface.
pub fn read_mac_address(interface: &str) -> Result<MacAddress> {
    let path = interface_address_path(interface);
    let text = fs::read_to_string(&path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    text.parse()
}
