//! 递归深度预算与 RAII 帧守卫。
//!
//! # 教案式说明
//! - **Why**：编码与解码都按表递归，深度必须有上限，且任何提前返回都要正确回退计数；
//! - **How**：上下文实现 [`Nesting`] 暴露自己的 [`DepthBudget`]，[`FrameGuard`] 在创建时加一、
//!   析构时减一，并通过 `DerefMut` 继续提供上下文，递归调用直接传入守卫即可；
//! - **What**：深度达到上限后再进入一层返回 [`CodecError::DepthLimitExceeded`]。

use std::num::NonZeroU16;
use std::ops::{Deref, DerefMut};

use crate::CodecError;

/// 深度计数与上限。
#[derive(Clone, Copy, Debug)]
pub struct DepthBudget {
    limit: NonZeroU16,
    current: u16,
}

impl DepthBudget {
    /// 以给定上限创建。
    pub fn new(limit: NonZeroU16) -> Self {
        Self { limit, current: 0 }
    }

    /// 当前深度。
    pub fn current(&self) -> u16 {
        self.current
    }

    /// 上限。
    pub fn limit(&self) -> NonZeroU16 {
        self.limit
    }
}

/// 携带深度预算的上下文。
pub trait Nesting {
    /// 可变访问深度预算。
    fn depth_mut(&mut self) -> &mut DepthBudget;
}

/// 进入一层表的守卫。
pub struct FrameGuard<'c, C: Nesting> {
    ctx: &'c mut C,
}

impl<'c, C: Nesting> FrameGuard<'c, C> {
    /// 进入一层；超过上限时不修改计数。
    pub fn enter(ctx: &'c mut C) -> Result<Self, CodecError> {
        let budget = ctx.depth_mut();
        if budget.current >= budget.limit.get() {
            return Err(CodecError::DepthLimitExceeded {
                limit: budget.limit.get(),
            });
        }
        budget.current += 1;
        Ok(Self { ctx })
    }
}

impl<C: Nesting> Deref for FrameGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: Nesting> DerefMut for FrameGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: Nesting> Drop for FrameGuard<'_, C> {
    fn drop(&mut self) {
        let budget = self.ctx.depth_mut();
        budget.current = budget.current.saturating_sub(1);
    }
}
