//! 变长数值字段：最小宽度计算、浮点精度选择与按字节序放置。
//!
//! # 教案式说明
//! - **Why**：整数、字符串长度与回引用偏移共用同一套“省略高位零字节”的编码，浮点则在单/双精度间择优；
//! - **How**：字段始终是值在某一字节序下的本机尺寸表示中“有效的那一端”：小端取前 `w` 字节，
//!   大端取后 `w` 字节；解码时先按需反转，再按宿主字节序补齐高位零；
//! - **What**：宽度 0 只属于零值，调用方（编码器）用 ZERO 操作码表示零整数，不会写出 0 宽度的整数字段。

use crate::endian::{Endian, correct_endianness};

/// 宽度字段最多 8 字节。
pub const MAX_FIELD_WIDTH: usize = 8;

/// 返回表示 `value` 所需的最小字节数；省略的高位字节全为零。零值返回 0。
pub fn minimal_width(value: u64) -> u8 {
    (u64::BITS - value.leading_zeros()).div_ceil(8) as u8
}

/// 按流字节序排列、已截去高位零字节的定长字段。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    bytes: [u8; MAX_FIELD_WIDTH],
    width: u8,
}

impl Field {
    /// 字段宽度，即写入操作码高半字节的值。
    pub fn width(&self) -> u8 {
        self.width
    }

    /// 字段字节。
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.width)]
    }

    fn from_significant(full: [u8; MAX_FIELD_WIDTH], width: u8, endian: Endian) -> Self {
        let w = usize::from(width);
        let mut bytes = [0u8; MAX_FIELD_WIDTH];
        match endian {
            Endian::Little => bytes[..w].copy_from_slice(&full[..w]),
            Endian::Big => bytes[..w].copy_from_slice(&full[MAX_FIELD_WIDTH - w..]),
        }
        Self { bytes, width }
    }
}

/// 以最小宽度编码无符号整数。
pub fn uint_field(value: u64, endian: Endian) -> Field {
    let full = match endian {
        Endian::Little => value.to_le_bytes(),
        Endian::Big => value.to_be_bytes(),
    };
    Field::from_significant(full, minimal_width(value), endian)
}

/// 以最小宽度编码回引用偏移；偏移字段至少占 1 字节。
pub fn offset_field(offset: u64, endian: Endian) -> Field {
    let full = match endian {
        Endian::Little => offset.to_le_bytes(),
        Endian::Big => offset.to_be_bytes(),
    };
    Field::from_significant(full, minimal_width(offset).max(1), endian)
}

/// 浮点字段的精度选择结果。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FloatField {
    /// 单精度可以精确表示。
    Single(f32),
    /// 需要双精度。
    Double(f64),
}

impl FloatField {
    /// 字段宽度：4 或 8。
    pub fn width(&self) -> u8 {
        match self {
            FloatField::Single(_) => 4,
            FloatField::Double(_) => 8,
        }
    }

    /// 按给定字节序生成字段字节。
    pub fn to_field(self, endian: Endian) -> Field {
        let mut bytes = [0u8; MAX_FIELD_WIDTH];
        match (self, endian) {
            (FloatField::Single(v), Endian::Little) => bytes[..4].copy_from_slice(&v.to_le_bytes()),
            (FloatField::Single(v), Endian::Big) => bytes[..4].copy_from_slice(&v.to_be_bytes()),
            (FloatField::Double(v), Endian::Little) => bytes = v.to_le_bytes(),
            (FloatField::Double(v), Endian::Big) => bytes = v.to_be_bytes(),
        }
        Field {
            bytes,
            width: self.width(),
        }
    }
}

/// 单精度往返后数值不变时选择 4 字节，否则选择 8 字节。
///
/// NaN 与自身不相等，因此总是以双精度保存，原始载荷位不会丢失。
pub fn encode_float_minimal(value: f64) -> FloatField {
    let single = value as f32;
    if f64::from(single) == value {
        FloatField::Single(single)
    } else {
        FloatField::Double(value)
    }
}

/// 读取最多 8 字节的无符号整数字段。
///
/// `field` 按流字节序排列；先校正到宿主字节序，再在宿主的高位端补零。
pub fn read_uint(field: &[u8], stream: Endian, host: Endian) -> u64 {
    let w = field.len().min(MAX_FIELD_WIDTH);
    let mut scratch = [0u8; MAX_FIELD_WIDTH];
    scratch[..w].copy_from_slice(&field[..w]);
    correct_endianness(&mut scratch[..w], stream, host);

    let mut full = [0u8; MAX_FIELD_WIDTH];
    match host {
        Endian::Little => {
            full[..w].copy_from_slice(&scratch[..w]);
            u64::from_le_bytes(full)
        }
        Endian::Big => {
            full[MAX_FIELD_WIDTH - w..].copy_from_slice(&scratch[..w]);
            u64::from_be_bytes(full)
        }
    }
}

/// 读取 4 或 8 字节的浮点字段；其余宽度由调用方在之前拒绝。
pub fn read_float(field: &[u8], stream: Endian, host: Endian) -> Option<f64> {
    match field.len() {
        4 => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(field);
            correct_endianness(&mut raw, stream, host);
            let single = match host {
                Endian::Little => f32::from_le_bytes(raw),
                Endian::Big => f32::from_be_bytes(raw),
            };
            Some(f64::from(single))
        }
        8 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(field);
            correct_endianness(&mut raw, stream, host);
            Some(match host {
                Endian::Little => f64::from_le_bytes(raw),
                Endian::Big => f64::from_be_bytes(raw),
            })
        }
        _ => None,
    }
}
