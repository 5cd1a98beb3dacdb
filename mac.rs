use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// 48-bit hardware address of an Ethernet interface or a Bluetooth device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn new(addr: [u8; 6]) -> Self {
        MacAddress(addr)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    /// Parses `xx:xx:xx:xx:xx:xx`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::InvalidMac(s.to_string()));
        }

        let mut mac = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::InvalidMac(s.to_string()));
            }
            mac[i] = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidMac(s.to_string()))?;
        }
        Ok(MacAddress(mac))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address_mixed_case() {
        let mac: MacAddress = "Aa:Bb:Cc:Dd:Ee:Ff".parse().unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_mac_address_sysfs_line() {
        let mac: MacAddress = "b8:27:eb:12:34:56\n".parse().unwrap();
        assert_eq!(mac, MacAddress::new([0xB8, 0x27, 0xEB, 0x12, 0x34, 0x56]));
    }

    #[test]
    fn test_mac_address_invalid() {
        assert!("11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("11:22:33:44:55:66:77".parse::<MacAddress>().is_err());
        assert!("GG:22:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("112:2:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("+1:22:33:44:55:66".parse::<MacAddress>().is_err());
    }
}
