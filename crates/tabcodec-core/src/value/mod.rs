//! 动态值模型：编解码器消费与产出的 nil / 布尔 / 数值 / 字符串 / 表。
//!
//! # 模块定位（Why）
//! - 编解码核心只通过 [`HostValue`] 契约与宿主值模型交互；
//! - 本模块同时提供一个可直接使用的参考实现 [`Value`] / [`Table`]，
//!   语义与常见脚本运行时一致：整数与浮点按数学值比较，整数值浮点键归一化为整数键，
//!   nil 与 NaN 不能作为键，赋 nil 即删除。
//!
//! # 结构（How）
//! - `number`：[`Number`]，区分整数与浮点子类型；
//! - `table`：[`Table`] 共享句柄、[`WeakTable`] 弱句柄与 [`TableId`] 身份键；
//! - `host`：[`HostValue`] 契约与 [`ValueView`] 分类视图。

mod host;
mod number;
mod table;

use std::collections::HashSet;

use bytes::Bytes;

pub use host::{HostValue, ValueView};
pub use number::Number;
pub use table::{InvalidKey, Table, TableId, WeakTable};

/// 参考值模型。
///
/// `PartialEq` 对表比较身份（同一实例）；按内容比较请使用 [`Value::deep_eq`]。
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// 空值。
    #[default]
    Nil,
    /// 布尔。
    Boolean(bool),
    /// 数值。
    Number(Number),
    /// 字节串，长度显式，可包含任意字节。
    String(Bytes),
    /// 表句柄。
    Table(Table),
}

impl Value {
    /// 类型名，与宿主语言的 `type()` 习惯保持一致。
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
        }
    }

    /// 是否为 nil。
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// 取布尔值。
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// 取数值。
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// 取字符串字节。
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// 取表句柄。
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// 按内容比较两个值，表递归比较条目（含插入顺序），可处理环。
    ///
    /// # 教案式说明
    /// - **Why**：`PartialEq` 对表只比较身份，往返测试需要“结构相等”；
    /// - **How**：记录已进入比较的 `(左表, 右表)` 身份对，再次遇到同一对时视为相等，
    ///   因而环结构不会无限递归；
    /// - **What**：表相等当且仅当条目数相同且按插入顺序逐对键、值结构相等。
    pub fn deep_eq(&self, other: &Value) -> bool {
        let mut visiting = HashSet::new();
        deep_eq_inner(self, other, &mut visiting)
    }
}

fn deep_eq_inner(a: &Value, b: &Value, visiting: &mut HashSet<(TableId, TableId)>) -> bool {
    match (a, b) {
        (Value::Table(left), Value::Table(right)) => {
            if !visiting.insert((left.id(), right.id())) {
                return true;
            }
            let left_entries = left.entries();
            let right_entries = right.entries();
            left_entries.len() == right_entries.len()
                && left_entries.iter().zip(&right_entries).all(|((lk, lv), (rk, rv))| {
                    deep_eq_inner(lk, rk, visiting) && deep_eq_inner(lv, rv, visiting)
                })
        }
        _ => a == b,
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(i64::from(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Bytes::from(value))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::String(Bytes::copy_from_slice(value))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::String(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}
