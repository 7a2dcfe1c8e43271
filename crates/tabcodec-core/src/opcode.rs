//! 操作码定义与操作码字节的拆装。
//!
//! 低半字节为标签，高半字节为宽度。只有 INT、FLOAT、STRING、TABLE_REF 四个标签携带宽度，
//! 其余标签的高半字节必须为零。

use crate::CodecError;

/// 值与表结构的标签。
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// nil。
    Nil = 0x0,
    /// 布尔真。
    True = 0x1,
    /// 布尔假。
    False = 0x2,
    /// 数值零，无负载。
    Zero = 0x3,
    /// 整数，宽度 1..=8。
    Int = 0x4,
    /// 浮点，宽度 4 或 8。
    Float = 0x5,
    /// 字符串，宽度为长度字段的字节数 0..=8。
    String = 0x6,
    /// 表开始。
    Table = 0x7,
    /// 表回引用，宽度为偏移字段的字节数 1..=8。
    TableRef = 0x8,
    /// 数组段与映射段的分隔。
    TableDelimiter = 0x9,
    /// 表结束。
    TableEnd = 0xA,
}

const TAG_MASK: u8 = 0x0F;
const WIDTH_SHIFT: u32 = 4;

impl Tag {
    /// 从低半字节解析标签。
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & TAG_MASK {
            0x0 => Tag::Nil,
            0x1 => Tag::True,
            0x2 => Tag::False,
            0x3 => Tag::Zero,
            0x4 => Tag::Int,
            0x5 => Tag::Float,
            0x6 => Tag::String,
            0x7 => Tag::Table,
            0x8 => Tag::TableRef,
            0x9 => Tag::TableDelimiter,
            0xA => Tag::TableEnd,
            _ => return None,
        })
    }

    /// 标签是否携带宽度半字节。
    pub const fn carries_width(self) -> bool {
        matches!(self, Tag::Int | Tag::Float | Tag::String | Tag::TableRef)
    }

    /// 该标签允许的宽度。
    pub fn accepts_width(self, width: u8) -> bool {
        match self {
            Tag::Int | Tag::TableRef => (1..=8).contains(&width),
            Tag::Float => width == 4 || width == 8,
            Tag::String => width <= 8,
            _ => width == 0,
        }
    }

    /// 不带宽度的操作码字节。
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// 组合标签与宽度。
    pub const fn with_width(self, width: u8) -> u8 {
        self as u8 | (width << WIDTH_SHIFT)
    }

    /// 宽度对应的半字节，供回填使用。
    pub const fn width_nibble(width: u8) -> u8 {
        width << WIDTH_SHIFT
    }
}

/// 已校验的操作码。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    /// 标签。
    pub tag: Tag,
    /// 宽度，不携带宽度的标签恒为 0。
    pub width: u8,
}

impl Opcode {
    /// 解析并校验 `offset` 处的操作码字节。
    pub fn parse(byte: u8, offset: usize) -> Result<Self, CodecError> {
        let tag = Tag::from_bits(byte).ok_or(CodecError::UnknownOpcode {
            opcode: byte,
            offset,
        })?;
        let width = byte >> WIDTH_SHIFT;
        if !tag.carries_width() && width != 0 {
            return Err(CodecError::UnknownOpcode {
                opcode: byte,
                offset,
            });
        }
        if !tag.accepts_width(width) {
            return Err(CodecError::InvalidWidth {
                opcode: byte,
                width,
                offset,
            });
        }
        Ok(Self { tag, width })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_tags_roundtrip() {
        let byte = Tag::Int.with_width(2);
        assert_eq!(byte, 0x24);
        assert_eq!(
            Opcode::parse(byte, 0),
            Ok(Opcode {
                tag: Tag::Int,
                width: 2
            })
        );
    }

    #[test]
    fn structural_tags_reject_width() {
        assert_eq!(
            Opcode::parse(0x17, 5),
            Err(CodecError::UnknownOpcode {
                opcode: 0x17,
                offset: 5
            })
        );
    }

    #[test]
    fn invalid_widths_are_rejected() {
        assert!(matches!(
            Opcode::parse(Tag::Float.with_width(2), 0),
            Err(CodecError::InvalidWidth { width: 2, .. })
        ));
        assert!(matches!(
            Opcode::parse(Tag::Int.with_width(0), 0),
            Err(CodecError::InvalidWidth { width: 0, .. })
        ));
        assert!(matches!(
            Opcode::parse(Tag::Int.with_width(9), 0),
            Err(CodecError::InvalidWidth { width: 9, .. })
        ));
        assert!(Opcode::parse(Tag::String.with_width(0), 0).is_ok());
    }

    #[test]
    fn unassigned_tags_are_unknown() {
        for bits in 0xB..=0xF {
            assert!(matches!(
                Opcode::parse(bits, 0),
                Err(CodecError::UnknownOpcode { .. })
            ));
        }
    }
}
