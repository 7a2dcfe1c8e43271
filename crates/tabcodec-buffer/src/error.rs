//! 缓冲层错误定义。

use thiserror::Error;

/// 缓冲操作可能出现的错误。
///
/// # 契约说明（What）
/// - `AllocationFailure`：扩容时分配器拒绝请求。对编码调用而言属于致命错误，整次调用随之失败；
/// - `CapacityOverflow`：请求的总长度超过 `usize` 可表示范围；
/// - `OutOfRange`：定位或回填的位置超出已写区间。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// 分配器无法提供所需容量。
    #[error("buffer allocation of {requested} bytes failed")]
    AllocationFailure {
        /// 本次扩容希望达到的总容量。
        requested: usize,
    },
    /// 目标长度溢出 `usize`。
    #[error("buffer length overflow: {position} + {additional} exceeds usize::MAX")]
    CapacityOverflow {
        /// 写入起点。
        position: usize,
        /// 追加的字节数。
        additional: usize,
    },
    /// 访问位置不在已写区间内。
    #[error("buffer position {position} is outside the written range 0..{len}")]
    OutOfRange {
        /// 请求访问的位置。
        position: usize,
        /// 当前已写长度。
        len: usize,
    },
}
