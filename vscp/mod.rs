//! VSCP event model and its two wire forms.

pub mod class;
pub mod event;
pub mod guid;
pub mod level1;
pub mod level2;
pub mod measurement;

pub use class::{DataType, InformationType, MeasurementType, VscpClass, VscpType, WeatherType};
pub use event::{EventData, Priority, Timestamp, VscpEvent};
pub use guid::{Guid, GuidBuilder, GuidPrefix, GuidSource};
