//! The subset of VSCP classes and types produced by this crate.

use crate::error::{Error, Result};

/// Classes below this code are Level I classes.
pub const LEVEL2_CLASS_BASE: u16 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum VscpClass {
    Measurement = 10,
    Data = 15,
    Information = 20,
    Weather = 90,
    /// Level II measurement carried as a string.
    MeasurementStr = 1040,
}

impl VscpClass {
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            10 => Ok(VscpClass::Measurement),
            15 => Ok(VscpClass::Data),
            20 => Ok(VscpClass::Information),
            90 => Ok(VscpClass::Weather),
            1040 => Ok(VscpClass::MeasurementStr),
            other => Err(Error::UnknownClass(other)),
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_level1(self) -> bool {
        self.code() < LEVEL2_CLASS_BASE
    }
}

/// Shared by the Level I measurement class and its Level II string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MeasurementType {
    Length = 2,
    Temperature = 6,
    Pressure = 12,
    ElectricalPotential = 16,
    ElectricalResistance = 18,
    Illuminance = 25,
    Humidity = 35,
    Dewpoint = 49,
}

impl MeasurementType {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            2 => Some(MeasurementType::Length),
            6 => Some(MeasurementType::Temperature),
            12 => Some(MeasurementType::Pressure),
            16 => Some(MeasurementType::ElectricalPotential),
            18 => Some(MeasurementType::ElectricalResistance),
            25 => Some(MeasurementType::Illuminance),
            35 => Some(MeasurementType::Humidity),
            49 => Some(MeasurementType::Dewpoint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DataType {
    SignalQuality = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum InformationType {
    NodeHeartbeat = 9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum WeatherType {
    UvIndex = 52,
}

/// A type code, tagged with the class family it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VscpType {
    Measurement(MeasurementType),
    /// Measurement type code without a named variant here.
    MeasurementOther(u16),
    Data(DataType),
    Information(InformationType),
    Weather(WeatherType),
}

impl VscpType {
    /// Any measurement type code, named when known.
    pub fn measurement(code: u16) -> Self {
        match MeasurementType::from_code(code) {
            Some(t) => VscpType::Measurement(t),
            None => VscpType::MeasurementOther(code),
        }
    }

    pub fn from_codes(vscp_class: u16, vscp_type: u16) -> Result<Self> {
        let unknown = Error::UnknownType { vscp_class, vscp_type };
        match VscpClass::from_code(vscp_class)? {
            VscpClass::Measurement | VscpClass::MeasurementStr => Ok(VscpType::measurement(vscp_type)),
            VscpClass::Data if vscp_type == DataType::SignalQuality as u16 => {
                Ok(VscpType::Data(DataType::SignalQuality))
            }
            VscpClass::Information if vscp_type == InformationType::NodeHeartbeat as u16 => {
                Ok(VscpType::Information(InformationType::NodeHeartbeat))
            }
            VscpClass::Weather if vscp_type == WeatherType::UvIndex as u16 => Ok(VscpType::Weather(WeatherType::UvIndex)),
            _ => Err(unknown),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            VscpType::Measurement(t) => t as u16,
            VscpType::MeasurementOther(code) => code,
            VscpType::Data(t) => t as u16,
            VscpType::Information(t) => t as u16,
            VscpType::Weather(t) => t as u16,
        }
    }

    pub fn belongs_to(self, class: VscpClass) -> bool {
        matches!(
            (class, self),
            (
                VscpClass::Measurement | VscpClass::MeasurementStr,
                VscpType::Measurement(_) | VscpType::MeasurementOther(_)
            )
                | (VscpClass::Data, VscpType::Data(_))
                | (VscpClass::Information, VscpType::Information(_))
                | (VscpClass::Weather, VscpType::Weather(_))
        )
    }
}

impl From<MeasurementType> for VscpType {
    fn from(t: MeasurementType) -> Self {
        VscpType::Measurement(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_codes() {
        assert_eq!(
            VscpType::from_codes(1040, 6).unwrap(),
            VscpType::Measurement(MeasurementType::Temperature)
        );
        assert_eq!(
            VscpType::from_codes(20, 9).unwrap(),
            VscpType::Information(InformationType::NodeHeartbeat)
        );
        assert_eq!(VscpType::from_codes(10, 999).unwrap(), VscpType::MeasurementOther(999));
        assert_eq!(VscpType::from_codes(1040, 71).unwrap().code(), 71);
        assert!(matches!(VscpType::from_codes(15, 1), Err(Error::UnknownType { .. })));
        assert!(matches!(VscpType::from_codes(20, 6), Err(Error::UnknownType { .. })));
        assert!(matches!(VscpType::from_codes(7, 1), Err(Error::UnknownClass(7))));
    }

    #[test]
    fn test_level1_classes() {
        assert!(VscpClass::Weather.is_level1());
        assert!(!VscpClass::MeasurementStr.is_level1());
    }

    #[test]
    fn test_belongs_to() {
        let temperature = VscpType::Measurement(MeasurementType::Temperature);
        assert!(temperature.belongs_to(VscpClass::Measurement));
        assert!(temperature.belongs_to(VscpClass::MeasurementStr));
        assert!(!temperature.belongs_to(VscpClass::Information));

        let other = VscpType::measurement(71);
        assert_eq!(other, VscpType::MeasurementOther(71));
        assert!(other.belongs_to(VscpClass::MeasurementStr));
        assert!(!other.belongs_to(VscpClass::Weather));
        assert_eq!(VscpType::measurement(6), VscpType::Measurement(MeasurementType::Temperature));
    }
}
