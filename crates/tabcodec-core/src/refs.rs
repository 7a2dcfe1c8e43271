//! 单次调用内的表引用登记。
//!
//! 编码侧以表身份为键记录表正文的起始偏移，解码侧以偏移为键记录已构造的表句柄。
//! 两者都随调用创建、随调用释放，并受 [`CodecLimits::max_refs`](crate::CodecLimits::max_refs) 约束。

use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::CodecError;
use crate::value::TableId;

/// 编码侧登记：表身份到 TABLE 操作码偏移。
#[derive(Debug)]
pub struct WriteRefs {
    offsets: HashMap<TableId, usize>,
    limit: NonZeroUsize,
}

impl WriteRefs {
    /// 创建空登记表。
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            offsets: HashMap::new(),
            limit,
        }
    }

    /// 查询表是否已写出，返回其偏移。
    pub fn lookup(&self, id: TableId) -> Option<usize> {
        self.offsets.get(&id).copied()
    }

    /// 登记新表；超过上限时返回 [`CodecError::RefTableOverflow`]。
    pub fn register(&mut self, id: TableId, offset: usize) -> Result<(), CodecError> {
        if self.offsets.len() >= self.limit.get() {
            return Err(CodecError::RefTableOverflow {
                limit: self.limit.get(),
            });
        }
        self.offsets.insert(id, offset);
        Ok(())
    }

    /// 已登记的表数量。
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 是否尚未登记任何表。
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// 解码侧登记：TABLE 操作码偏移到表句柄。
#[derive(Debug)]
pub struct ReadRefs<T> {
    tables: HashMap<usize, T>,
    limit: NonZeroUsize,
}

impl<T> ReadRefs<T> {
    /// 创建空登记表。
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            tables: HashMap::new(),
            limit,
        }
    }

    /// 登记刚开始构造的表，先于其子元素登记，子元素才能回引用它。
    pub fn register(&mut self, offset: usize, table: T) -> Result<(), CodecError> {
        if self.tables.len() >= self.limit.get() {
            return Err(CodecError::RefTableOverflow {
                limit: self.limit.get(),
            });
        }
        self.tables.insert(offset, table);
        Ok(())
    }

    /// 按流中声明的偏移查找表。
    pub fn resolve(&self, target: u64) -> Option<&T> {
        let offset = usize::try_from(target).ok()?;
        self.tables.get(&offset)
    }

    /// 已登记的表数量。
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// 是否尚未登记任何表。
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// 取出全部句柄，登记表随之清空。
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.tables.drain().map(|(_, table)| table)
    }

    /// 释放全部句柄，返回释放数量。
    pub fn release(&mut self) -> usize {
        let released = self.tables.len();
        self.tables.clear();
        released
    }
}
