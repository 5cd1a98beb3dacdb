//! Field extraction from raw calibration and data register blocks.
//!
//! Multi-byte calibration words are little-endian (low byte first). Callers
//! guarantee that `index` plus the field width fits the block; reading past
//! the end panics.

pub fn u8_at(data: &[u8], index: usize) -> u8 {
    data[index]
}

pub fn i8_at(data: &[u8], index: usize) -> i8 {
    data[index] as i8
}

pub fn u16_at(data: &[u8], index: usize) -> u16 {
    u16::from_le_bytes([data[index], data[index + 1]])
}

pub fn i16_at(data: &[u8], index: usize) -> i16 {
    i16::from_le_bytes([data[index], data[index + 1]])
}

/// 20-bit ADC value spread over msb, lsb and the high nibble of xlsb.
pub fn adc20_at(data: &[u8], index: usize) -> u32 {
    (u32::from(data[index]) << 12) | (u32::from(data[index + 1]) << 4) | (u32::from(data[index + 2]) >> 4)
}

/// 16-bit ADC value, msb first.
pub fn adc16_at(data: &[u8], index: usize) -> u16 {
    u16::from_be_bytes([data[index], data[index + 1]])
}
