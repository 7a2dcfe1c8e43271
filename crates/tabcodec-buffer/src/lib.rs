//! `tabcodec-buffer` 提供编码器写出侧使用的可增长字节缓冲。
//!
//! # 模块定位（Why）
//! - 编码器需要一个“只追加、偶尔回填”的字节容器：先写操作码、再写负载，
//!   最后把宽度半字节 OR 回已经写出的操作码字节。
//! - 将缓冲独立为 crate，使 `tabcodec-core` 只依赖一组很小的契约（追加、定位、回填、冻结），
//!   与 `bytes::Bytes` 的零拷贝交付对接。
//!
//! # 设计概要（How）
//! - [`Buffer`] 以 `Vec<u8>` 为存储，按 `max(capacity × 2, capacity + needed)` 扩容，
//!   通过 `try_reserve_exact` 将分配失败显式化为 [`BufferError::AllocationFailure`]；
//! - 写游标 `position` 可以回退（[`Buffer::seek`]），回退后的写入覆盖旧字节；
//! - [`Buffer::freeze`] 将已写内容转换为只读的 [`bytes::Bytes`]，不复制数据。

mod buffer;
mod error;

pub use buffer::Buffer;
pub use error::BufferError;
