//! 字节序标记与多字节字段的字节序校正。

use serde::{Deserialize, Serialize};

use crate::CodecError;

/// 流或宿主的字节序。
///
/// # 契约说明（What）
/// - 头部标记：`0x00` 表示小端，`0x01` 表示大端；
/// - [`Endian::NATIVE`] 为编译目标的本机字节序，也是 [`Codec`](crate::Codec) 的默认值。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endian {
    /// 小端。
    Little,
    /// 大端。
    Big,
}

impl Endian {
    /// 编译目标的本机字节序。
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;
    /// 编译目标的本机字节序。
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;

    /// 写入流头部的标记字节。
    pub const fn marker(self) -> u8 {
        match self {
            Endian::Little => 0x00,
            Endian::Big => 0x01,
        }
    }

    /// 解析流头部的标记字节。
    pub fn from_marker(marker: u8) -> Result<Self, CodecError> {
        match marker {
            0x00 => Ok(Endian::Little),
            0x01 => Ok(Endian::Big),
            _ => Err(CodecError::UnknownEndianMarker { marker }),
        }
    }

    /// 返回相反的字节序。
    pub const fn opposite(self) -> Self {
        match self {
            Endian::Little => Endian::Big,
            Endian::Big => Endian::Little,
        }
    }
}

impl Default for Endian {
    fn default() -> Self {
        Endian::NATIVE
    }
}

/// 当流字节序与宿主字节序不同时，原地反转字段字节。
pub fn correct_endianness(field: &mut [u8], stream: Endian, host: Endian) {
    if stream != host {
        field.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_roundtrip_and_rejection() {
        for endian in [Endian::Little, Endian::Big] {
            assert_eq!(Endian::from_marker(endian.marker()), Ok(endian));
        }
        assert_eq!(
            Endian::from_marker(0x02),
            Err(CodecError::UnknownEndianMarker { marker: 0x02 })
        );
    }

    #[test]
    fn correction_only_swaps_on_mismatch() {
        let mut same = [1, 2, 3];
        correct_endianness(&mut same, Endian::Big, Endian::Big);
        assert_eq!(same, [1, 2, 3]);

        let mut swapped = [1, 2, 3];
        correct_endianness(&mut swapped, Endian::Big, Endian::Little);
        assert_eq!(swapped, [3, 2, 1]);
    }
}
