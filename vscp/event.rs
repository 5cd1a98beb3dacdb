use std::fmt;

use crate::error::{Error, Result};
use crate::vscp::class::{VscpClass, VscpType};
use crate::vscp::guid::Guid;

/// Payload limit of a Level I (CAN sized) frame.
pub const LEVEL1_MAX_DATA: usize = 8;
/// Payload limit of a Level II frame.
pub const LEVEL2_MAX_DATA: usize = 487;

/// The node has no registers or decision matrix.
pub const HEADER16_DUMB: u16 = 0x8000;
const PRIORITY_SHIFT: u16 = 5;
const PRIORITY_MASK: u16 = 0x07 << PRIORITY_SHIFT;

/// 0 is the highest priority, 7 the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(3);
    pub const LOWEST: Priority = Priority(7);

    pub fn new(value: u8) -> Result<Self> {
        if value > 7 {
            return Err(Error::InvalidPriority(value));
        }
        Ok(Priority(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

/// Microsecond timestamp, or 0 to let the receiving interface stamp it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timestamp {
    #[default]
    Interface,
    Micros(u32),
}

impl Timestamp {
    pub fn value(self) -> u32 {
        match self {
            Timestamp::Interface => 0,
            Timestamp::Micros(t) => t,
        }
    }
}

/// Fixed-capacity payload buffer with an explicit used length.
#[derive(Clone)]
pub struct EventData {
    bytes: [u8; LEVEL2_MAX_DATA],
    len: usize,
    capacity: usize,
}

impl EventData {
    pub fn with_capacity(capacity: usize) -> Self {
        EventData {
            bytes: [0; LEVEL2_MAX_DATA],
            len: 0,
            capacity: capacity.min(LEVEL2_MAX_DATA),
        }
    }

    pub fn for_class(class: VscpClass) -> Self {
        if class.is_level1() {
            EventData::with_capacity(LEVEL1_MAX_DATA)
        } else {
            EventData::with_capacity(LEVEL2_MAX_DATA)
        }
    }

    /// Appends `data`. Nothing is written when it does not fit.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        let len = self.len + data.len();
        if len > self.capacity {
            return Err(Error::PayloadTooLarge {
                len,
                capacity: self.capacity,
            });
        }
        self.bytes[self.len..len].copy_from_slice(data);
        self.len = len;
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.extend_from_slice(&[byte])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventData")
            .field("data", &self.as_slice())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl PartialEq for EventData {
    fn eq(&self, other: &Self) -> bool {
        self.capacity == other.capacity && self.as_slice() == other.as_slice()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VscpEvent {
    pub priority: Priority,
    /// Header flags without the priority bits.
    pub flags: u16,
    pub class: VscpClass,
    pub vscp_type: VscpType,
    pub guid: Guid,
    pub obid: u32,
    pub timestamp: Timestamp,
    /// ISO 8601 UTC, e.g. `2021-11-02T12:34:56Z`.
    pub datetime: Option<String>,
    pub data: EventData,
}

impl VscpEvent {
    /// A dumb-node event at normal priority with an empty payload.
    pub fn new(class: VscpClass, vscp_type: VscpType, guid: Guid) -> Result<Self> {
        if !vscp_type.belongs_to(class) {
            return Err(Error::ClassTypeMismatch {
                vscp_class: class.code(),
                vscp_type: vscp_type.code(),
            });
        }
        Ok(VscpEvent {
            priority: Priority::NORMAL,
            flags: HEADER16_DUMB,
            class,
            vscp_type,
            guid,
            obid: 0,
            timestamp: Timestamp::Interface,
            datetime: None,
            data: EventData::for_class(class),
        })
    }

    pub fn with_data(mut self, data: &[u8]) -> Result<Self> {
        self.data.extend_from_slice(data)?;
        Ok(self)
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Header word with the priority packed into bits 5..7.
    pub fn head(&self) -> u16 {
        (self.flags & !PRIORITY_MASK) | (u16::from(self.priority.value()) << PRIORITY_SHIFT)
    }

    pub fn sizedata(&self) -> usize {
        self.data.len()
    }
}
