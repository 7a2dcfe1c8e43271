//! 值编码：把一个宿主值及其可达的表写入缓冲。
//!
//! # 教案式说明
//! - **Why**：编码需要在一次调用内记住已写出的表，重复出现时写回引用而非再次展开，环结构因此可终止；
//! - **How**：
//!   - 标量按固定规则映射到操作码；带宽度的操作码先写标签字节，追加字段后再把宽度回填到高半字节；
//!   - 表在递归子元素之前登记自身偏移，子元素引用祖先时即可命中；
//!   - 数组段从键 1 开始按遍历顺序匹配连续整数键，第一次不匹配即结束，其余条目全部进入映射段；
//! - **What**：任何错误都会中止编码，缓冲中已写入的内容由调用方丢弃。

use std::num::NonZeroU16;

use tabcodec_buffer::Buffer;

use crate::CodecError;
use crate::depth::{DepthBudget, FrameGuard, Nesting};
use crate::endian::Endian;
use crate::limits::CodecLimits;
use crate::opcode::Tag;
use crate::refs::WriteRefs;
use crate::value::{HostValue, Number, ValueView};
use crate::width::{Field, encode_float_minimal, offset_field, uint_field};

/// 一次编码调用的上下文。
#[derive(Debug)]
pub struct EncodeContext {
    refs: WriteRefs,
    endian: Endian,
    depth: DepthBudget,
}

impl EncodeContext {
    /// 按上限与流字节序创建。
    pub fn new(limits: &CodecLimits, endian: Endian) -> Self {
        Self {
            refs: WriteRefs::new(limits.max_refs()),
            endian,
            depth: DepthBudget::new(limits.max_depth()),
        }
    }

    /// 已登记的表。
    pub fn refs(&self) -> &WriteRefs {
        &self.refs
    }

    /// 流字节序。
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// 当前嵌套深度。
    pub fn depth(&self) -> u16 {
        self.depth.current()
    }

    /// 深度上限。
    pub fn max_depth(&self) -> NonZeroU16 {
        self.depth.limit()
    }
}

impl Nesting for EncodeContext {
    fn depth_mut(&mut self) -> &mut DepthBudget {
        &mut self.depth
    }
}

/// 在当前位置编码一个值。
pub fn encode_value<V: HostValue>(
    value: &V,
    buffer: &mut Buffer,
    ctx: &mut EncodeContext,
) -> Result<(), CodecError> {
    match value.classify() {
        ValueView::Nil => buffer.append_byte(Tag::Nil.bits())?,
        ValueView::Boolean(true) => buffer.append_byte(Tag::True.bits())?,
        ValueView::Boolean(false) => buffer.append_byte(Tag::False.bits())?,
        ValueView::Number(number) => encode_number(number, buffer, ctx.endian)?,
        ValueView::String(bytes) => {
            put_sized(buffer, Tag::String, uint_field(bytes.len() as u64, ctx.endian))?;
            buffer.append_bytes(bytes)?;
        }
        ValueView::Table(table) => encode_table::<V>(table, buffer, ctx)?,
        ValueView::Unsupported(type_name) => {
            return Err(CodecError::UnsupportedValueType { type_name });
        }
    }
    Ok(())
}

fn encode_number(number: Number, buffer: &mut Buffer, endian: Endian) -> Result<(), CodecError> {
    if number.is_zero() {
        buffer.append_byte(Tag::Zero.bits())?;
        return Ok(());
    }
    match number.as_integer() {
        // 负数按二进制补码视作无符号，宽度总是 8。
        Some(integer) => put_sized(buffer, Tag::Int, uint_field(integer as u64, endian)),
        None => put_sized(
            buffer,
            Tag::Float,
            encode_float_minimal(number.as_f64()).to_field(endian),
        ),
    }
}

/// 写标签字节与字段，再把宽度回填进标签字节的高半字节。
fn put_sized(buffer: &mut Buffer, tag: Tag, field: Field) -> Result<(), CodecError> {
    let opcode_at = buffer.position();
    buffer.append_byte(tag.bits())?;
    buffer.append_bytes(field.as_bytes())?;
    *buffer.mutable_byte_at(opcode_at)? |= Tag::width_nibble(field.width());
    Ok(())
}

fn encode_table<V: HostValue>(
    table: &V::Table,
    buffer: &mut Buffer,
    ctx: &mut EncodeContext,
) -> Result<(), CodecError> {
    let id = V::table_identity(table);
    if let Some(offset) = ctx.refs.lookup(id) {
        tracing::trace!(offset, "writing table back-reference");
        return put_sized(buffer, Tag::TableRef, offset_field(offset as u64, ctx.endian));
    }

    let mut frame = FrameGuard::enter(ctx)?;
    frame.refs.register(id, buffer.position())?;
    buffer.append_byte(Tag::Table.bits())?;

    let entries = V::for_each_entry(table);
    let mut rest = entries.iter();
    let mut first_hashed = None;
    let mut index: i64 = 1;
    for entry in rest.by_ref() {
        if is_array_key(&entry.0, index) {
            encode_value(&entry.1, buffer, &mut *frame)?;
            index += 1;
        } else {
            first_hashed = Some(entry);
            break;
        }
    }

    buffer.append_byte(Tag::TableDelimiter.bits())?;
    for (key, value) in first_hashed.into_iter().chain(rest) {
        encode_value(key, buffer, &mut *frame)?;
        encode_value(value, buffer, &mut *frame)?;
    }
    buffer.append_byte(Tag::TableEnd.bits())?;
    Ok(())
}

fn is_array_key<V: HostValue>(key: &V, expected: i64) -> bool {
    matches!(key.classify(), ValueView::Number(n) if n.as_integer() == Some(expected))
}
