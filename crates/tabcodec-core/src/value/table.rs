//! 共享表句柄。
//!
//! # 教案式说明
//! - **Why**：表需要身份语义，两个位置引用同一张表时，编码只写一次正文，解码后依然是同一实例；
//! - **How**：`Rc<RefCell<_>>` 提供单线程共享可变性，条目按插入顺序存放于 `Vec`，
//!   另以归一化键建立 `HashMap` 索引；删除只留下墓碑，墓碑数超过存活条目时整体压实，
//!   因此逐个删除 n 个键的总代价是线性的；
//! - **Trade-offs**：环形表在句柄全部释放后不会自动回收，需要调用方用 [`Table::clear`] 断环。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use bytes::Bytes;
use thiserror::Error;

use super::{Number, Value};

/// 表身份键，同一实例的所有句柄返回相同的值。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

impl TableId {
    /// 由宿主提供的稳定身份（通常是对象地址）构造。
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// 原始身份值。
    pub const fn into_raw(self) -> usize {
        self.0
    }
}

/// 不能用作表键的值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidKey {
    /// nil 键。
    #[error("table key is nil")]
    Nil,
    /// NaN 键。
    #[error("table key is NaN")]
    NaN,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TableKey {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(Bytes),
    Table(TableId),
}

/// 校验并归一化键：整数值浮点转为整数键。
fn normalize_key(key: Value) -> Result<(TableKey, Value), InvalidKey> {
    let normalized = match &key {
        Value::Nil => return Err(InvalidKey::Nil),
        Value::Boolean(b) => TableKey::Boolean(*b),
        Value::Number(n) if n.is_nan() => return Err(InvalidKey::NaN),
        Value::Number(n) => match n.as_integer() {
            Some(i) => {
                return Ok((TableKey::Integer(i), Value::Number(Number::Integer(i))));
            }
            None => TableKey::Float(n.as_f64().to_bits()),
        },
        Value::String(bytes) => TableKey::String(bytes.clone()),
        Value::Table(table) => TableKey::Table(table.id()),
    };
    Ok((normalized, key))
}

struct Slot {
    key: TableKey,
    entry: (Value, Value),
}

#[derive(Default)]
struct TableData {
    slots: Vec<Option<Slot>>,
    index: HashMap<TableKey, usize>,
}

impl TableData {
    fn insert(&mut self, normalized: TableKey, key: Value, value: Value) {
        let position = self.slots.len();
        self.index.insert(normalized.clone(), position);
        self.slots.push(Some(Slot {
            key: normalized,
            entry: (key, value),
        }));
    }

    /// 以墓碑替换条目，返回被移出的键值供调用方在借用结束后释放。
    fn remove(&mut self, normalized: &TableKey) -> Option<(Value, Value)> {
        let position = self.index.remove(normalized)?;
        let removed = self.slots[position].take().map(|slot| slot.entry);
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        if self.slots.len() > 2 * self.index.len() + 8 {
            self.compact();
        }
        removed
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (position, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                self.index.insert(slot.key.clone(), position);
            }
        }
    }

    fn live(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.slots.iter().flatten().map(|slot| &slot.entry)
    }
}

/// 表句柄，克隆得到的是同一张表。
#[derive(Clone, Default)]
pub struct Table {
    inner: Rc<RefCell<TableData>>,
}

impl Table {
    /// 创建空表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 1 起始的连续整数键创建数组表。
    pub fn array<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let table = Self::new();
        {
            let mut data = table.inner.borrow_mut();
            for (slot, value) in values.into_iter().map(Into::into).enumerate() {
                if value.is_nil() {
                    continue;
                }
                let key = slot as i64 + 1;
                data.insert(TableKey::Integer(key), Value::from(key), value);
            }
        }
        table
    }

    /// 表身份。
    pub fn id(&self) -> TableId {
        TableId(Rc::as_ptr(&self.inner).cast::<()>() as usize)
    }

    /// 两个句柄是否指向同一张表。
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// 条目数。
    pub fn len(&self) -> usize {
        self.inner.borrow().index.len()
    }

    /// 是否为空表。
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().index.is_empty()
    }

    /// 读取键对应的值；键不存在或非法时返回 `None`。
    pub fn get(&self, key: impl Into<Value>) -> Option<Value> {
        let (normalized, _) = normalize_key(key.into()).ok()?;
        let data = self.inner.borrow();
        let position = *data.index.get(&normalized)?;
        let slot = data.slots[position].as_ref()?;
        Some(slot.entry.1.clone())
    }

    /// 写入键值；值为 nil 时删除该键，已有键原位更新并保持插入顺序。
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), InvalidKey> {
        let (normalized, key) = normalize_key(key.into())?;
        let value = value.into();
        let removed = {
            let mut data = self.inner.borrow_mut();
            match (data.index.get(&normalized).copied(), value.is_nil()) {
                (Some(position), false) => {
                    if let Some(slot) = data.slots[position].as_mut() {
                        slot.entry.1 = value;
                    }
                    None
                }
                (Some(_), true) => data.remove(&normalized),
                (None, false) => {
                    data.insert(normalized, key, value);
                    None
                }
                (None, true) => None,
            }
        };
        drop(removed);
        Ok(())
    }

    /// 在数组边界之后追加，即写入键 `border() + 1`；追加 nil 不产生条目。
    pub fn push(&self, value: impl Into<Value>) {
        let value = value.into();
        if value.is_nil() {
            return;
        }
        let key = self.border() + 1;
        self.inner
            .borrow_mut()
            .insert(TableKey::Integer(key), Value::from(key), value);
    }

    /// 从 1 开始连续存在的最大整数键；空表或键 1 缺失时为 0。
    pub fn border(&self) -> i64 {
        let data = self.inner.borrow();
        let mut border = 0;
        while data.index.contains_key(&TableKey::Integer(border + 1)) {
            border += 1;
        }
        border
    }

    /// 按插入顺序返回条目快照。
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.inner.borrow().live().cloned().collect()
    }

    /// 清空条目，可用于断开环形引用。
    pub fn clear(&self) {
        let removed = {
            let mut data = self.inner.borrow_mut();
            data.index.clear();
            std::mem::take(&mut data.slots)
        };
        drop(removed);
    }

    /// 不持有所有权的句柄，不会阻止表被回收。
    pub fn downgrade(&self) -> WeakTable {
        WeakTable {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// [`Table`] 的弱句柄。
#[derive(Clone, Default)]
pub struct WeakTable {
    inner: Weak<RefCell<TableData>>,
}

impl WeakTable {
    /// 表仍存活时取回强句柄。
    pub fn upgrade(&self) -> Option<Table> {
        self.inner.upgrade().map(|inner| Table { inner })
    }
}

impl fmt::Debug for WeakTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakTable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("id", &format_args!("{:#x}", self.id().into_raw()))
            .field("len", &self.len())
            .finish()
    }
}
