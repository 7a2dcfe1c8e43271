//! 值解码：从字节流中读取一个值及其可达的表。
//!
//! # 教案式说明
//! - **Why**：输入不可信，每一次读取都必须先确认剩余字节足够，每一个回引用都必须指向已解码的表；
//! - **How**：
//!   - 内部 `Reader` 负责边界检查，任何越界读取都报告 [`CodecError::TruncatedInput`]；
//!   - 表在读取子元素之前以 TABLE 操作码偏移登记，子元素回引用祖先（含自身）时可直接命中；
//!   - 数组段逐个读取值并追加到键 1, 2, …，直到窥视到 DELIM；映射段逐对读取直到 END；
//!   - 字符串以 [`Bytes::slice`] 切出，不复制负载；
//! - **What**：DELIM、END 出现在值位置时按未知操作码拒绝；nil / NaN 键按 [`CodecError::InvalidTableKey`] 拒绝。

use bytes::Bytes;

use crate::CodecError;
use crate::depth::{DepthBudget, FrameGuard, Nesting};
use crate::endian::Endian;
use crate::limits::CodecLimits;
use crate::opcode::{Opcode, Tag};
use crate::refs::ReadRefs;
use crate::value::{HostValue, Number};
use crate::width::{read_float, read_uint};

/// 一次解码调用的上下文，`T` 为宿主表句柄类型。
#[derive(Debug)]
pub struct DecodeContext<T> {
    refs: ReadRefs<T>,
    stream: Endian,
    host: Endian,
    depth: DepthBudget,
}

impl<T> DecodeContext<T> {
    /// 按上限、流字节序与宿主字节序创建。
    pub fn new(limits: &CodecLimits, stream: Endian, host: Endian) -> Self {
        Self {
            refs: ReadRefs::new(limits.max_refs()),
            stream,
            host,
            depth: DepthBudget::new(limits.max_depth()),
        }
    }

    /// 已登记的表。
    pub fn refs(&self) -> &ReadRefs<T> {
        &self.refs
    }

    /// 流字节序。
    pub fn stream_endian(&self) -> Endian {
        self.stream
    }

    /// 当前嵌套深度。
    pub fn depth(&self) -> u16 {
        self.depth.current()
    }

    /// 释放本次调用持有的全部表句柄，返回释放数量。
    pub fn release(&mut self) -> usize {
        self.refs.release()
    }

    /// 解码失败时丢弃半成品：逐一清空已登记的表再释放句柄，返回清空数量。
    pub fn discard<V>(&mut self) -> usize
    where
        V: HostValue<Table = T>,
    {
        let mut discarded = 0;
        for table in self.refs.drain() {
            V::table_clear(&table);
            discarded += 1;
        }
        discarded
    }
}

impl<T> Nesting for DecodeContext<T> {
    fn depth_mut(&mut self) -> &mut DepthBudget {
        &mut self.depth
    }
}

/// 从 `pos` 处解码一个值，返回值与其后的第一个偏移。
///
/// 偏移是整条流中的绝对位置，回引用依赖这一点，因此调用方传入的是完整输入而非切片。
pub fn decode_value<V: HostValue>(
    bytes: &Bytes,
    pos: usize,
    ctx: &mut DecodeContext<V::Table>,
) -> Result<(V, usize), CodecError> {
    let mut reader = Reader { bytes, pos };
    let value = read_value::<V>(&mut reader, ctx)?;
    Ok((value, reader.pos))
}

struct Reader<'a> {
    bytes: &'a Bytes,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn require(&self, needed: usize) -> Result<(), CodecError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::TruncatedInput {
                offset: self.pos,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    fn peek(&self) -> Result<u8, CodecError> {
        self.require(1)?;
        Ok(self.bytes[self.pos])
    }

    fn take_byte(&mut self) -> Result<u8, CodecError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        self.require(len)?;
        let bytes: &'a Bytes = self.bytes;
        let field = &bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(field)
    }

    fn take_shared(&mut self, len: usize) -> Result<Bytes, CodecError> {
        self.require(len)?;
        let shared = self.bytes.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(shared)
    }
}

fn read_value<V: HostValue>(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<V::Table>,
) -> Result<V, CodecError> {
    let offset = reader.pos;
    let byte = reader.take_byte()?;
    let opcode = Opcode::parse(byte, offset)?;
    let width = usize::from(opcode.width);
    match opcode.tag {
        Tag::Nil => Ok(V::from_nil()),
        Tag::True => Ok(V::from_boolean(true)),
        Tag::False => Ok(V::from_boolean(false)),
        Tag::Zero => Ok(V::from_number(Number::Integer(0))),
        Tag::Int => {
            let raw = read_uint(reader.take(width)?, ctx.stream, ctx.host);
            // 宽度 8 的字段按二进制补码还原负数。
            Ok(V::from_number(Number::Integer(raw as i64)))
        }
        Tag::Float => {
            let field = reader.take(width)?;
            let value = read_float(field, ctx.stream, ctx.host).ok_or(CodecError::InvalidWidth {
                opcode: byte,
                width: opcode.width,
                offset,
            })?;
            Ok(V::from_number(Number::Float(value)))
        }
        Tag::String => {
            let len_at = reader.pos;
            let declared = read_uint(reader.take(width)?, ctx.stream, ctx.host);
            let len = usize::try_from(declared).map_err(|_| CodecError::TruncatedInput {
                offset: len_at + width,
                needed: usize::MAX,
                remaining: reader.remaining(),
            })?;
            Ok(V::from_string(reader.take_shared(len)?))
        }
        Tag::Table => read_table::<V>(reader, ctx, offset),
        Tag::TableRef => {
            let target = read_uint(reader.take(width)?, ctx.stream, ctx.host);
            let table = ctx
                .refs
                .resolve(target)
                .cloned()
                .ok_or(CodecError::DanglingReference { target, offset })?;
            tracing::trace!(target, offset, "resolved table back-reference");
            Ok(V::from_table(table))
        }
        Tag::TableDelimiter | Tag::TableEnd => Err(CodecError::UnknownOpcode {
            opcode: byte,
            offset,
        }),
    }
}

fn read_table<V: HostValue>(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeContext<V::Table>,
    offset: usize,
) -> Result<V, CodecError> {
    let mut frame = FrameGuard::enter(ctx)?;
    let table = V::make_table();
    frame.refs.register(offset, table.clone())?;

    let mut index: i64 = 1;
    while reader.peek()? != Tag::TableDelimiter.bits() {
        let value_at = reader.pos;
        let value = read_value::<V>(reader, &mut *frame)?;
        V::table_append(&table, index, value).map_err(|source| CodecError::InvalidTableKey {
            offset: value_at,
            source,
        })?;
        index += 1;
    }
    reader.take_byte()?;

    while reader.peek()? != Tag::TableEnd.bits() {
        let key_at = reader.pos;
        let key = read_value::<V>(reader, &mut *frame)?;
        let value = read_value::<V>(reader, &mut *frame)?;
        V::table_set(&table, key, value).map_err(|source| CodecError::InvalidTableKey {
            offset: key_at,
            source,
        })?;
    }
    reader.take_byte()?;

    Ok(V::from_table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{InvalidKey, Table, Value};

    fn decode(input: &[u8]) -> Result<(Value, usize), CodecError> {
        let limits = CodecLimits::default();
        let mut ctx = DecodeContext::<Table>::new(&limits, Endian::Little, Endian::Little);
        decode_value::<Value>(&Bytes::copy_from_slice(input), 0, &mut ctx)
    }

    #[test]
    fn scalars_decode_and_report_next_offset() {
        assert_eq!(decode(&[0x00]), Ok((Value::Nil, 1)));
        assert_eq!(decode(&[0x03]), Ok((Value::from(0), 1)));
        assert_eq!(decode(&[0x24, 0x00, 0x01, 0xEE]), Ok((Value::from(256), 3)));
        assert_eq!(decode(&[0x26, 0x02, 0x00, b'h', b'i']), Ok((Value::from("hi"), 5)));
    }

    #[test]
    fn structural_markers_are_not_values() {
        assert_eq!(
            decode(&[0x09]),
            Err(CodecError::UnknownOpcode {
                opcode: 0x09,
                offset: 0
            })
        );
        assert_eq!(
            decode(&[0x07, 0x09, 0x0A, 0x0A]).map(|(_, next)| next),
            Ok(3),
            "尾随的 END 不属于该值"
        );
    }

    #[test]
    fn self_reference_resolves_to_same_table() {
        let (value, _) = decode(&[0x07, 0x18, 0x00, 0x09, 0x0A]).expect("自引用");
        let table = value.as_table().expect("表").clone();
        let inner = table.get(1).expect("元素");
        assert!(inner.as_table().expect("表").ptr_eq(&table));
        table.clear();
    }

    #[test]
    fn nil_keys_are_rejected_with_offset() {
        assert_eq!(
            decode(&[0x07, 0x09, 0x00, 0x01, 0x0A]),
            Err(CodecError::InvalidTableKey {
                offset: 2,
                source: InvalidKey::Nil
            })
        );
    }

    #[test]
    fn oversized_string_length_is_truncation() {
        assert!(matches!(
            decode(&[0x16, 0x05, b'a']),
            Err(CodecError::TruncatedInput {
                offset: 2,
                needed: 5,
                remaining: 1
            })
        ));
    }
}
