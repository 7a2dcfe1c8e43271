//! 宿主值契约：编解码器与具体值模型之间唯一的接缝。
//!
//! # 设计背景（Why）
//! - 编解码器不拥有值模型；嵌入到不同运行时时，只需为其值类型实现 [`HostValue`]；
//! - 编码侧需要“分类 + 表身份 + 条目遍历”，解码侧需要“构造 + 写入表”，两者都收敛在同一 trait 中。
//!
//! # 契约说明（What）
//! - [`HostValue::table_identity`] 对同一张表的所有句柄必须返回相同值，且在一次调用期间保持稳定；
//! - [`HostValue::for_each_entry`] 返回的顺序决定数组段的划分，必须与宿主的遍历顺序一致；
//! - [`HostValue::table_set`] 对 nil / NaN 键返回 [`InvalidKey`]，解码器据此拒绝输入；
//! - [`HostValue::table_clear`] 在解码失败时作用于本次调用构造的每一张表，
//!   引用计数型宿主借此断开半成品中的环。

use bytes::Bytes;

use super::{InvalidKey, Number, Table, TableId, Value};

/// 编码器看到的值分类。
#[derive(Debug)]
pub enum ValueView<'a, T> {
    /// nil。
    Nil,
    /// 布尔。
    Boolean(bool),
    /// 数值。
    Number(Number),
    /// 字节串。
    String(&'a [u8]),
    /// 表句柄。
    Table(&'a T),
    /// 宿主类型不受支持，携带类型名用于报错。
    Unsupported(&'static str),
}

/// 宿主值模型需要实现的能力。
pub trait HostValue: Sized {
    /// 表句柄类型，克隆必须得到同一张表。
    type Table: Clone;

    /// 把值归入可编码的类别。
    fn classify(&self) -> ValueView<'_, Self::Table>;

    /// 表身份。
    fn table_identity(table: &Self::Table) -> TableId;

    /// 按宿主遍历顺序返回表条目。
    fn for_each_entry(table: &Self::Table) -> Vec<(Self, Self)>;

    /// 创建空表。
    fn make_table() -> Self::Table;

    /// 写入一个键值对。
    fn table_set(table: &Self::Table, key: Self, value: Self) -> Result<(), InvalidKey>;

    /// 写入数组段中第 `index` 个元素（从 1 开始）。
    fn table_append(table: &Self::Table, index: i64, value: Self) -> Result<(), InvalidKey> {
        Self::table_set(table, Self::from_number(Number::Integer(index)), value)
    }

    /// 清空表条目；默认不做任何事，适用于带追踪式回收的宿主。
    fn table_clear(_table: &Self::Table) {}

    /// 构造 nil。
    fn from_nil() -> Self;

    /// 构造布尔。
    fn from_boolean(value: bool) -> Self;

    /// 构造数值。
    fn from_number(value: Number) -> Self;

    /// 构造字符串；`bytes` 可能是输入缓冲的零拷贝切片。
    fn from_string(bytes: Bytes) -> Self;

    /// 把表句柄包装为值。
    fn from_table(table: Self::Table) -> Self;
}

impl HostValue for Value {
    type Table = Table;

    fn classify(&self) -> ValueView<'_, Table> {
        match self {
            Value::Nil => ValueView::Nil,
            Value::Boolean(b) => ValueView::Boolean(*b),
            Value::Number(n) => ValueView::Number(*n),
            Value::String(bytes) => ValueView::String(bytes),
            Value::Table(table) => ValueView::Table(table),
        }
    }

    fn table_identity(table: &Table) -> TableId {
        table.id()
    }

    fn for_each_entry(table: &Table) -> Vec<(Self, Self)> {
        table.entries()
    }

    fn make_table() -> Table {
        Table::new()
    }

    fn table_set(table: &Table, key: Self, value: Self) -> Result<(), InvalidKey> {
        table.set(key, value)
    }

    fn table_clear(table: &Table) {
        table.clear();
    }

    fn from_nil() -> Self {
        Value::Nil
    }

    fn from_boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    fn from_number(value: Number) -> Self {
        Value::Number(value)
    }

    fn from_string(bytes: Bytes) -> Self {
        Value::String(bytes)
    }

    fn from_table(table: Table) -> Self {
        Value::Table(table)
    }
}
