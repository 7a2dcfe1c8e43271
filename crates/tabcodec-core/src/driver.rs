//! 顶层驱动：信封头部、逐值编解码与整次调用的生命周期。
//!
//! # 教案式说明
//! - **Why**：`pack` / `unpack` 是唯一的对外入口，引用表、深度计数等状态必须随调用创建并随调用释放，
//!   两次调用之间不共享任何可变状态；
//! - **How**：
//!   - 编码：写字节序标记与计数字节，逐值调用编码器，最后冻结缓冲；
//!   - 解码：校验头部，逐值调用解码器并串接偏移，确认恰好消费完输入；
//!   - 每次调用包在一个 `debug` 级 span 中，完成与拒绝各打一条事件，拒绝事件携带稳定错误码；
//! - **What**：失败时不返回部分结果；已构造的表先经 [`HostValue::table_clear`] 清空，
//!   再随上下文一同释放，回引用形成的环因此不会残留。

use bytes::Bytes;
use tabcodec_buffer::Buffer;

use crate::CodecError;
use crate::decoder::{DecodeContext, decode_value};
use crate::encoder::{EncodeContext, encode_value};
use crate::endian::Endian;
use crate::limits::CodecLimits;
use crate::value::{HostValue, Value};

/// 信封头部长度：字节序标记与计数各一字节。
pub const HEADER_LEN: usize = 2;

/// 单次调用最多携带的顶层值数量。
pub const MAX_VALUES: usize = u8::MAX as usize;

/// 编解码器配置与入口。
///
/// ```
/// use tabcodec_core::{Codec, Table, Value};
///
/// let config = Table::array([Value::from("alpha"), Value::from(2)]);
/// config.set("enabled", true).unwrap();
///
/// let codec = Codec::new();
/// let bytes = codec.pack(&[Value::from(config)]).unwrap();
/// let values: Vec<Value> = codec.unpack(&bytes).unwrap();
/// let table = values[0].as_table().unwrap();
/// assert_eq!(table.get("enabled"), Some(Value::from(true)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Codec {
    limits: CodecLimits,
    stream_endian: Endian,
    host_endian: Endian,
}

impl Codec {
    /// 默认配置：本机字节序与默认上限。
    pub fn new() -> Self {
        Self::default()
    }

    /// 替换资源上限。
    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 编码时写入的流字节序。
    pub fn with_stream_endian(mut self, endian: Endian) -> Self {
        self.stream_endian = endian;
        self
    }

    /// 解码时作为目标的宿主字节序，用于在单一机器上验证跨字节序行为。
    pub fn with_host_endian(mut self, endian: Endian) -> Self {
        self.host_endian = endian;
        self
    }

    /// 当前上限。
    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    /// 当前流字节序。
    pub fn stream_endian(&self) -> Endian {
        self.stream_endian
    }

    /// 当前宿主字节序。
    pub fn host_endian(&self) -> Endian {
        self.host_endian
    }

    /// 把 0..=255 个值编码为一条字节流。
    pub fn pack<V: HostValue>(&self, values: &[V]) -> Result<Bytes, CodecError> {
        let span = tracing::debug_span!("tabcodec.pack", values = values.len());
        let _entered = span.enter();
        let result = self.pack_values(values);
        match &result {
            Ok(bytes) => tracing::debug!(len = bytes.len(), "pack completed"),
            Err(error) => tracing::debug!(code = error.code(), %error, "pack failed"),
        }
        result
    }

    fn pack_values<V: HostValue>(&self, values: &[V]) -> Result<Bytes, CodecError> {
        let count = u8::try_from(values.len()).map_err(|_| CodecError::TooManyValues {
            count: values.len(),
        })?;
        let mut buffer = Buffer::new(self.limits.initial_capacity())?;
        buffer.append_byte(self.stream_endian.marker())?;
        buffer.append_byte(count)?;

        let mut ctx = EncodeContext::new(&self.limits, self.stream_endian);
        for value in values {
            encode_value(value, &mut buffer, &mut ctx)?;
        }
        tracing::trace!(tables = ctx.refs().len(), "released write references");
        Ok(buffer.freeze())
    }

    /// 解码字节流；输入被复制一次，字符串共享这份副本。
    pub fn unpack<V: HostValue>(&self, data: &[u8]) -> Result<Vec<V>, CodecError> {
        self.unpack_bytes(Bytes::copy_from_slice(data))
    }

    /// 解码共享字节流；字符串是 `data` 的零拷贝切片。
    pub fn unpack_bytes<V: HostValue>(&self, data: Bytes) -> Result<Vec<V>, CodecError> {
        let span = tracing::debug_span!("tabcodec.unpack", len = data.len());
        let _entered = span.enter();
        let result = self.unpack_values(&data);
        match &result {
            Ok(values) => tracing::debug!(values = values.len(), "unpack completed"),
            Err(error) => tracing::debug!(code = error.code(), %error, "unpack rejected input"),
        }
        result
    }

    fn unpack_values<V: HostValue>(&self, data: &Bytes) -> Result<Vec<V>, CodecError> {
        if data.len() < HEADER_LEN {
            return Err(CodecError::TruncatedInput {
                offset: 0,
                needed: HEADER_LEN,
                remaining: data.len(),
            });
        }
        let stream = Endian::from_marker(data[0])?;
        let count = usize::from(data[1]);

        let mut ctx = DecodeContext::<V::Table>::new(&self.limits, stream, self.host_endian);
        match Self::decode_all::<V>(data, count, &mut ctx) {
            Ok(values) => {
                let released = ctx.release();
                tracing::trace!(released, "released read references");
                Ok(values)
            }
            Err(error) => {
                let discarded = ctx.discard::<V>();
                tracing::trace!(discarded, "discarded partial tables");
                Err(error)
            }
        }
    }

    fn decode_all<V: HostValue>(
        data: &Bytes,
        count: usize,
        ctx: &mut DecodeContext<V::Table>,
    ) -> Result<Vec<V>, CodecError> {
        let mut values = Vec::with_capacity(count);
        let mut pos = HEADER_LEN;
        for _ in 0..count {
            let (value, next) = decode_value::<V>(data, pos, ctx)?;
            values.push(value);
            pos = next;
        }
        if pos != data.len() {
            return Err(CodecError::TrailingBytes {
                remaining: data.len() - pos,
            });
        }
        Ok(values)
    }
}

/// 以默认配置编码参考值模型。
pub fn pack(values: &[Value]) -> Result<Bytes, CodecError> {
    Codec::new().pack(values)
}

/// 以默认配置解码为参考值模型。
pub fn unpack(data: &[u8]) -> Result<Vec<Value>, CodecError> {
    Codec::new().unpack(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Table;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn rejection_is_logged_with_error_code() {
        let result = unpack(&[0x00, 0x01, 0x0B]);
        assert!(matches!(result, Err(CodecError::UnknownOpcode { .. })));
        assert!(logs_contain("unpack rejected input"));
        assert!(logs_contain("codec.unknown_opcode"));
    }

    #[traced_test]
    #[test]
    fn back_references_are_traced() {
        let shared = Table::new();
        let bytes = pack(&[Value::from(shared.clone()), Value::from(shared)]).expect("编码成功");
        unpack(&bytes).expect("解码成功");
        assert!(logs_contain("writing table back-reference"));
        assert!(logs_contain("resolved table back-reference"));
        assert!(logs_contain("pack completed"));
    }

    #[traced_test]
    #[test]
    fn failed_unpack_discards_partial_tables() {
        let result = unpack(&[0x00, 0x01, 0x07, 0x18, 0x02]);
        assert!(matches!(result, Err(CodecError::TruncatedInput { .. })));
        assert!(logs_contain("discarded partial tables"));
        assert!(logs_contain("discarded=1"));
    }

    #[test]
    fn count_byte_limits_top_level_values() {
        let values = vec![Value::Nil; MAX_VALUES + 1];
        assert_eq!(
            pack(&values),
            Err(CodecError::TooManyValues {
                count: MAX_VALUES + 1
            })
        );
        let bytes = pack(&values[..MAX_VALUES]).expect("255 个值");
        assert_eq!(bytes[1], 0xFF);
        assert_eq!(unpack(&bytes).expect("解码").len(), MAX_VALUES);
    }

    #[test]
    fn header_shorter_than_two_bytes_is_truncated() {
        assert_eq!(
            unpack(&[0x00]),
            Err(CodecError::TruncatedInput {
                offset: 0,
                needed: 2,
                remaining: 1
            })
        );
    }
}
