use bytes::Bytes;

use crate::BufferError;

/// 编码器使用的可增长字节缓冲。
///
/// # 设计动机（Why）
/// - 编码流程需要在写出负载之后回填操作码中的宽度半字节，因此缓冲除了顺序追加，
///   还必须支持按位置取得可变字节（[`Buffer::mutable_byte_at`]）以及回退写游标（[`Buffer::seek`]）。
/// - 编码结束后需要把结果交给调用方而不再复制，[`Buffer::freeze`] 直接移交底层存储。
///
/// # 结构说明（How）
/// - `data.len()` 为已写区间的高水位，`position` 为下一次写入的起点，始终满足 `position ≤ len ≤ capacity`；
/// - 容量不足时按 `max(capacity × 2, capacity + needed)` 计算目标容量，并以 `try_reserve_exact` 申请；
/// - 容量只增不减，扩容保留既有字节。
///
/// # 契约说明（What）
/// - 追加操作在 `position` 处写入：位于已写区间内的部分覆盖旧字节，超出部分追加；
/// - 任何失败路径都不会修改缓冲内容或游标。
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    position: usize,
}

impl Buffer {
    /// 以给定初始容量创建空缓冲。
    ///
    /// 初始容量的分配同样经过 `try_reserve_exact`，失败时返回 [`BufferError::AllocationFailure`]。
    pub fn new(initial_capacity: usize) -> Result<Self, BufferError> {
        let mut data = Vec::new();
        data.try_reserve_exact(initial_capacity)
            .map_err(|_| BufferError::AllocationFailure {
                requested: initial_capacity,
            })?;
        Ok(Self { data, position: 0 })
    }

    /// 追加单个字节。
    pub fn append_byte(&mut self, byte: u8) -> Result<(), BufferError> {
        self.append_bytes(&[byte])
    }

    /// 在写游标处写入一段字节，游标随之前移。
    pub fn append_bytes(&mut self, src: &[u8]) -> Result<(), BufferError> {
        let end = self
            .position
            .checked_add(src.len())
            .ok_or(BufferError::CapacityOverflow {
                position: self.position,
                additional: src.len(),
            })?;
        self.ensure_capacity(end, src.len())?;

        let overlap = self.data.len().min(end) - self.position;
        let (overwrite, extend) = src.split_at(overlap);
        self.data[self.position..self.position + overlap].copy_from_slice(overwrite);
        self.data.extend_from_slice(extend);
        self.position = end;
        Ok(())
    }

    /// 返回写游标位置。
    pub fn position(&self) -> usize {
        self.position
    }

    /// 移动写游标，允许回退到任意已写位置或停在已写区间末尾。
    pub fn seek(&mut self, position: usize) -> Result<(), BufferError> {
        if position > self.data.len() {
            return Err(BufferError::OutOfRange {
                position,
                len: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// 取得已写区间内某个字节的可变引用，用于回填操作码半字节。
    pub fn mutable_byte_at(&mut self, position: usize) -> Result<&mut u8, BufferError> {
        let len = self.data.len();
        self.data
            .get_mut(position)
            .ok_or(BufferError::OutOfRange { position, len })
    }

    /// 返回已写区间的只读视图。
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// 已写区间长度（高水位）。
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否尚未写入任何字节。
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 当前容量。
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// 清空内容并把游标归零，保留容量以便复用。
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }

    /// 冻结为只读 [`Bytes`]，移交底层存储。
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.data)
    }

    /// 取出底层 `Vec<u8>`。
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// 保证容量至少覆盖 `required_end`。
    ///
    /// # 教案式说明
    /// - **Why**：扩容策略决定了摊还成本，倍增避免频繁重分配，`capacity + needed` 保证一次大写入也能容纳；
    /// - **How**：目标容量为 `max(capacity × 2, capacity + needed)`，再与 `required_end` 取大，
    ///   差额交给 `try_reserve_exact`；
    /// - **What**：成功后 `capacity() ≥ required_end`；失败时缓冲保持原状。
    fn ensure_capacity(&mut self, required_end: usize, needed: usize) -> Result<(), BufferError> {
        let capacity = self.data.capacity();
        if required_end <= capacity {
            return Ok(());
        }

        let target = capacity
            .saturating_mul(2)
            .max(capacity.saturating_add(needed))
            .max(required_end);
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| BufferError::AllocationFailure { requested: target })
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_doubles_small_buffers() {
        let mut buffer = Buffer::new(4).expect("初始分配");
        let before = buffer.capacity();
        buffer.append_bytes(&vec![1u8; before]).expect("填满初始容量");
        buffer.append_byte(5).expect("触发扩容");
        assert!(buffer.capacity() >= before * 2);
        assert_eq!(buffer.len(), before + 1);
        assert_eq!(buffer.as_slice()[before], 5);
    }

    #[test]
    fn growth_fits_large_writes() {
        let mut buffer = Buffer::new(2).expect("初始分配");
        let payload = [7u8; 64];
        buffer.append_bytes(&payload).expect("一次写入大块数据");
        assert!(buffer.capacity() >= 64);
        assert_eq!(buffer.len(), 64);
    }

    #[test]
    fn zero_capacity_buffer_still_grows() {
        let mut buffer = Buffer::new(0).expect("零容量缓冲");
        buffer.append_byte(0xAB).expect("首次追加");
        assert_eq!(buffer.as_slice(), &[0xAB]);
    }
}
