pub mod bh1750;
pub mod bme280;
pub mod bme680;
pub mod bus;
pub mod compensation;
pub mod error;
pub mod events;
pub mod host;
pub mod mac;
pub mod publish;
pub mod registers;
pub mod sensorpuck;
pub mod settings;
pub mod structs;
pub mod transport;
pub mod vscp;

pub use error::{Error, Result};
