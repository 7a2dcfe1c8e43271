#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = "tabcodec-core: 动态值（nil / 布尔 / 数值 / 字符串 / 表）的紧凑二进制编解码。"]
#![doc = ""]
#![doc = "== 线格式概览 =="]
#![doc = "1. 信封：字节序标记（0x00 小端 / 0x01 大端）+ 计数字节（0..=255）+ 逐个编码的值。"]
#![doc = "2. 操作码：低半字节为标签，高半字节为宽度；整数、字符串长度与回引用偏移省略高位零字节。"]
#![doc = "3. 表：TABLE + 数组段 + DELIM + 映射段键值对 + END；重复出现的表写 TABLE_REF + 绝对偏移。"]
#![doc = ""]
#![doc = "== 安全边界 =="]
#![doc = "解码器面对不可信输入：每次读取都做边界检查，回引用必须指向已解码的表，"]
#![doc = "嵌套深度与表数量受 [`CodecLimits`] 约束，违规输入以 [`CodecError`] 拒绝而不会崩溃。"]
#![doc = ""]
#![doc = "== 宿主值 =="]
#![doc = "编解码器只依赖 [`HostValue`] 契约；[`Value`] / [`Table`] 是随附的参考实现。"]

mod decoder;
mod depth;
mod driver;
mod encoder;
pub mod endian;
pub mod error;
mod limits;
pub mod opcode;
mod refs;
pub mod value;
pub mod width;

pub use decoder::{DecodeContext, decode_value};
pub use driver::{Codec, HEADER_LEN, MAX_VALUES, pack, unpack};
pub use encoder::{EncodeContext, encode_value};
pub use endian::Endian;
pub use error::{CodecError, codes};
pub use limits::{CodecLimits, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_DEPTH, DEFAULT_MAX_REFS};
pub use refs::{ReadRefs, WriteRefs};
pub use value::{
    HostValue, InvalidKey, Number, Table, TableId, Value, ValueView, WeakTable,
};

pub use bytes::Bytes;
pub use tabcodec_buffer::{Buffer, BufferError};
