//! 资源上限配置。
//!
//! # 教案式说明
//! - **Why**：解码器面对的是不可信输入，嵌套深度与表数量都需要硬上限，避免栈溢出与内存放大；
//! - **How**：[`CodecLimits`] 可由代码构造（`with_*` 链式方法），也可通过 serde 从 TOML 加载，
//!   未出现的字段取默认值，未知字段直接报错；
//! - **What**：默认值为深度 128、表 65 536 张、初始缓冲 256 字节。

use std::num::{NonZeroU16, NonZeroUsize};

use serde::{Deserialize, Serialize};

/// 默认最大嵌套深度。
pub const DEFAULT_MAX_DEPTH: NonZeroU16 = match NonZeroU16::new(128) {
    Some(depth) => depth,
    None => unreachable!(),
};

/// 默认单次调用最多登记的表数量。
pub const DEFAULT_MAX_REFS: NonZeroUsize = match NonZeroUsize::new(65_536) {
    Some(refs) => refs,
    None => unreachable!(),
};

/// 默认初始缓冲容量。
pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// 编解码资源上限。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecLimits {
    max_depth: NonZeroU16,
    max_refs: NonZeroUsize,
    initial_capacity: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_refs: DEFAULT_MAX_REFS,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl CodecLimits {
    /// 表最大嵌套深度，顶层表计为 1。
    pub fn max_depth(&self) -> NonZeroU16 {
        self.max_depth
    }

    /// 单次调用最多登记的不同表数量。
    pub fn max_refs(&self) -> NonZeroUsize {
        self.max_refs
    }

    /// 编码缓冲的初始容量。
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// 设置最大嵌套深度。
    pub fn with_max_depth(mut self, max_depth: NonZeroU16) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 设置表数量上限。
    pub fn with_max_refs(mut self, max_refs: NonZeroUsize) -> Self {
        self.max_refs = max_refs;
        self
    }

    /// 设置初始缓冲容量，0 表示首次写入时再分配。
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// 从 TOML 文本加载。
    ///
    /// ```
    /// let limits = tabcodec_core::CodecLimits::from_toml_str("max_depth = 16").unwrap();
    /// assert_eq!(limits.max_depth().get(), 16);
    /// assert_eq!(limits.max_refs().get(), 65_536);
    /// ```
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(text: &str) -> Result<Self, crate::CodecError> {
        toml::from_str(text).map_err(|err| crate::CodecError::InvalidConfig {
            detail: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let limits = CodecLimits::default();
        assert_eq!(limits.max_depth().get(), 128);
        assert_eq!(limits.max_refs().get(), 65_536);
        assert_eq!(limits.initial_capacity(), 256);
    }

    #[test]
    fn builders_override_single_fields() {
        let limits = CodecLimits::default()
            .with_max_depth(NonZeroU16::new(4).expect("非零"))
            .with_initial_capacity(0);
        assert_eq!(limits.max_depth().get(), 4);
        assert_eq!(limits.max_refs(), DEFAULT_MAX_REFS);
        assert_eq!(limits.initial_capacity(), 0);
    }
}
