//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 编码与解码的所有失败路径集中在 [`CodecError`] 中，调用方只需处理一个错误类型；
//! - 每个变体都对应一个稳定的点分错误码（见 [`codes`]），日志与断言以错误码为准，不依赖展示文本。
//!
//! ## 设计要求（What）
//! - 任意错误都会中止整次 `pack`/`unpack` 调用，不返回部分结果；
//! - 解码错误表示“输入对本编解码器无效”，调用方不应在未修正输入的情况下重试；
//! - 错误携带出错的流偏移，便于定位畸形输入。

use thiserror::Error;

use tabcodec_buffer::BufferError;

use crate::value::InvalidKey;

/// 稳定错误码。
///
/// 错误码一经发布不得修改，新增变体需同步追加常量。
pub mod codes {
    /// 缓冲分配或定位失败。
    pub const BUFFER: &str = "codec.buffer";
    /// 单次调用中不同表的数量超过上限。
    pub const REF_TABLE_OVERFLOW: &str = "codec.ref_table_overflow";
    /// 宿主值类型不在支持集合内。
    pub const UNSUPPORTED_VALUE_TYPE: &str = "codec.unsupported_value_type";
    /// 顶层值数量超过计数字节可表示范围。
    pub const TOO_MANY_VALUES: &str = "codec.too_many_values";
    /// 表嵌套深度超过上限。
    pub const DEPTH_LIMIT_EXCEEDED: &str = "codec.depth_limit_exceeded";
    /// 输入在读取所需字节前耗尽。
    pub const TRUNCATED_INPUT: &str = "codec.truncated_input";
    /// 无法识别的操作码。
    pub const UNKNOWN_OPCODE: &str = "codec.unknown_opcode";
    /// 操作码携带的宽度半字节非法。
    pub const INVALID_WIDTH: &str = "codec.invalid_width";
    /// 回引用指向未登记的偏移。
    pub const DANGLING_REFERENCE: &str = "codec.dangling_reference";
    /// 流头部的字节序标记无法识别。
    pub const UNKNOWN_ENDIAN_MARKER: &str = "codec.unknown_endian_marker";
    /// 表键为 nil 或 NaN。
    pub const INVALID_TABLE_KEY: &str = "codec.invalid_table_key";
    /// 声明的值全部解码后仍有剩余字节。
    pub const TRAILING_BYTES: &str = "codec.trailing_bytes";
    /// 配置文本无法解析。
    pub const INVALID_CONFIG: &str = "codec.invalid_config";
}

/// 编解码错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把缓冲层、编码侧与解码侧的失败统一为一个枚举，`?` 可以贯穿整条递归调用链；
/// - **契约 (What)**：
///   - 编码侧：`Buffer`、`RefTableOverflow`、`UnsupportedValueType`、`TooManyValues`、`DepthLimitExceeded`；
///   - 解码侧：`TruncatedInput`、`UnknownOpcode`、`InvalidWidth`、`DanglingReference`、
///     `UnknownEndianMarker`、`InvalidTableKey`、`TrailingBytes`、`RefTableOverflow`、`DepthLimitExceeded`；
/// - **执行逻辑 (How)**：变体只携带整数偏移与静态字符串，克隆与比较开销很小，测试可直接断言具体变体。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// 缓冲扩容或定位失败，其中分配失败对整次编码调用是致命的。
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// 单次调用中登记的表数量超过 `max_refs`。
    #[error("reference table overflow: more than {limit} distinct tables in one call")]
    RefTableOverflow {
        /// 配置的上限。
        limit: usize,
    },

    /// 宿主值不属于 {nil, boolean, number, string, table}。
    #[error("unsupported value type `{type_name}`")]
    UnsupportedValueType {
        /// 宿主报告的类型名。
        type_name: &'static str,
    },

    /// 顶层值数量无法写入单字节计数。
    #[error("cannot pack {count} values: the envelope counts at most 255")]
    TooManyValues {
        /// 调用方传入的值数量。
        count: usize,
    },

    /// 表嵌套层级超过 `max_depth`。
    #[error("table nesting exceeds the configured depth limit {limit}")]
    DepthLimitExceeded {
        /// 配置的上限。
        limit: u16,
    },

    /// 输入在读取所需字节前耗尽。
    #[error("truncated input at offset {offset}: need {needed} bytes, {remaining} remain")]
    TruncatedInput {
        /// 读取起点。
        offset: usize,
        /// 本次读取需要的字节数。
        needed: usize,
        /// 实际剩余字节数。
        remaining: usize,
    },

    /// 该位置的字节不是合法的值操作码。
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode {
        /// 原始操作码字节。
        opcode: u8,
        /// 操作码所在偏移。
        offset: usize,
    },

    /// 宽度半字节不在该操作码允许的范围内。
    #[error("opcode {opcode:#04x} at offset {offset} carries invalid width {width}")]
    InvalidWidth {
        /// 原始操作码字节。
        opcode: u8,
        /// 解析出的宽度。
        width: u8,
        /// 操作码所在偏移。
        offset: usize,
    },

    /// 回引用指向的偏移不是此前已解码表的起点。
    #[error("dangling table reference to offset {target} at offset {offset}")]
    DanglingReference {
        /// 回引用声明的目标偏移。
        target: u64,
        /// 回引用操作码所在偏移。
        offset: usize,
    },

    /// 流头部的字节序标记未知。
    #[error("unknown endianness marker {marker:#04x}")]
    UnknownEndianMarker {
        /// 原始标记字节。
        marker: u8,
    },

    /// 表键不可用（nil 或 NaN）。
    #[error("invalid table key at offset {offset}: {source}")]
    InvalidTableKey {
        /// 键编码所在偏移。
        offset: usize,
        /// 具体原因。
        #[source]
        source: InvalidKey,
    },

    /// 声明的值全部解码后仍有剩余字节。
    #[error("{remaining} trailing bytes after the last declared value")]
    TrailingBytes {
        /// 剩余字节数。
        remaining: usize,
    },

    /// 配置文本无法解析为 [`CodecLimits`](crate::CodecLimits)。
    #[error("invalid codec configuration: {detail}")]
    InvalidConfig {
        /// 解析器给出的说明。
        detail: String,
    },
}

impl CodecError {
    /// 返回该错误的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::Buffer(_) => codes::BUFFER,
            CodecError::RefTableOverflow { .. } => codes::REF_TABLE_OVERFLOW,
            CodecError::UnsupportedValueType { .. } => codes::UNSUPPORTED_VALUE_TYPE,
            CodecError::TooManyValues { .. } => codes::TOO_MANY_VALUES,
            CodecError::DepthLimitExceeded { .. } => codes::DEPTH_LIMIT_EXCEEDED,
            CodecError::TruncatedInput { .. } => codes::TRUNCATED_INPUT,
            CodecError::UnknownOpcode { .. } => codes::UNKNOWN_OPCODE,
            CodecError::InvalidWidth { .. } => codes::INVALID_WIDTH,
            CodecError::DanglingReference { .. } => codes::DANGLING_REFERENCE,
            CodecError::UnknownEndianMarker { .. } => codes::UNKNOWN_ENDIAN_MARKER,
            CodecError::InvalidTableKey { .. } => codes::INVALID_TABLE_KEY,
            CodecError::TrailingBytes { .. } => codes::TRAILING_BYTES,
            CodecError::InvalidConfig { .. } => codes::INVALID_CONFIG,
        }
    }

    /// 是否由畸形输入引起（解码侧拒绝），用于区分调用方输入问题与资源限制。
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            CodecError::TruncatedInput { .. }
                | CodecError::UnknownOpcode { .. }
                | CodecError::InvalidWidth { .. }
                | CodecError::DanglingReference { .. }
                | CodecError::UnknownEndianMarker { .. }
                | CodecError::InvalidTableKey { .. }
                | CodecError::TrailingBytes { .. }
        )
    }
}
