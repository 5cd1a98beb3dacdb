use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::mac::MacAddress;

pub const GUID_LEN: usize = 16;

/// A 16-byte VSCP node identifier, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; GUID_LEN]);

impl Guid {
    pub const NULL: Guid = Guid([0; GUID_LEN]);

    pub fn new(bytes: [u8; GUID_LEN]) -> Self {
        Guid(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; GUID_LEN] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// 8-byte prefix, 6-byte MAC and a 2-byte sensor suffix.
    pub fn from_mac(prefix: GuidPrefix, mac: &MacAddress, suffix: u16) -> Self {
        let mut bytes = [0u8; GUID_LEN];
        bytes[..8].copy_from_slice(&prefix.bytes());
        bytes[8..14].copy_from_slice(&mac.octets());
        bytes[14..].copy_from_slice(&suffix.to_be_bytes());
        Guid(bytes)
    }

    /// 1-wire ids are read LSB first (family code first); the GUID carries
    /// them MSB first behind the 1-wire prefix.
    pub fn from_onewire(id: [u8; 8]) -> Self {
        let mut bytes = [0u8; GUID_LEN];
        bytes[..8].copy_from_slice(&GuidPrefix::OneWire.bytes());
        for (n, byte) in id.iter().rev().enumerate() {
            bytes[8 + n] = *byte;
        }
        Guid(bytes)
    }

    /// Same GUID with the two least significant bytes replaced.
    pub fn with_suffix(mut self, suffix: u16) -> Self {
        self.0[14..].copy_from_slice(&suffix.to_be_bytes());
        self
    }
}

impl FromStr for Guid {
    type Err = Error;

    /// Parses 16 colon separated hex groups. `-` is the null GUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "-" {
            return Ok(Guid::NULL);
        }
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != GUID_LEN {
            return Err(Error::InvalidGuid(s.to_string()));
        }
        let mut bytes = [0u8; GUID_LEN];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::InvalidGuid(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidGuid(s.to_string()))?;
        }
        Ok(Guid(bytes))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Fixed 8-byte prefixes for GUIDs derived from hardware ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidPrefix {
    Ethernet,
    Bluetooth,
    OneWire,
}

impl GuidPrefix {
    pub fn bytes(self) -> [u8; 8] {
        match self {
            GuidPrefix::Ethernet => [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE],
            GuidPrefix::Bluetooth => [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF8],
            GuidPrefix::OneWire => [0xFF; 8],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidSource {
    /// A configured GUID, used verbatim.
    Explicit(Guid),
    /// Derived from a hardware address.
    Mac { prefix: GuidPrefix, mac: MacAddress },
}

/// Hands out the origin GUID for each measurement of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidBuilder {
    source: GuidSource,
    apply_suffix_to_explicit_guid: bool,
}

impl GuidBuilder {
    pub fn new(source: GuidSource) -> Self {
        GuidBuilder {
            source,
            apply_suffix_to_explicit_guid: false,
        }
    }

    /// With `false` (the default) every measurement of an explicitly
    /// configured device shares the same GUID.
    pub fn apply_suffix_to_explicit_guid(mut self, apply: bool) -> Self {
        self.apply_suffix_to_explicit_guid = apply;
        self
    }

    pub fn build(&self, suffix: u16) -> Guid {
        match self.source {
            GuidSource::Explicit(guid) if self.apply_suffix_to_explicit_guid => guid.with_suffix(suffix),
            GuidSource::Explicit(guid) => guid,
            GuidSource::Mac { prefix, mac } => Guid::from_mac(prefix, &mac, suffix),
        }
    }
}
