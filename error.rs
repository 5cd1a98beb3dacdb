use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I2C bus error: {0}")]
    I2c(#[from] rppal::i2c::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported chip id 0x{0:02x}")]
    UnsupportedChip(u8),

    #[error("payload of {len} bytes exceeds the {capacity} byte frame limit")]
    PayloadTooLarge { len: usize, capacity: usize },

    #[error("invalid GUID '{0}'")]
    InvalidGuid(String),

    #[error("invalid MAC address '{0}'")]
    InvalidMac(String),

    #[error("priority {0} is outside 0..=7")]
    InvalidPriority(u8),

    #[error("unknown VSCP class {0}")]
    UnknownClass(u16),

    #[error("unknown VSCP type {vscp_type} for class {vscp_class}")]
    UnknownType { vscp_class: u16, vscp_type: u16 },

    #[error("type {vscp_type} does not belong to class {vscp_class}")]
    ClassTypeMismatch { vscp_class: u16, vscp_type: u16 },

    #[error("telnet session failed: {0}")]
    Telnet(String),

    #[error("MQTT client error: {0}")]
    MqttClient(#[from] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    MqttConnection(#[from] rumqttc::ConnectionError),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed input: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, Error>;
