//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义分片链缓冲在“访问期”可能出现的失败；构造期的越界（offset/length 超出范围）
//!   一律按裁剪处理，不会出现在这里。
//! - 为每个错误提供稳定的点分错误码，便于调用方在日志与告警中做精确匹配。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`，可直接交给 `anyhow`/`eyre` 等上层框架处理；
//! - 访问越界统一归入 `buffer.out_of_range`，跨缓冲游标运算归入 `buffer.invalid_operation`；
//! - 配置解析错误单独建模为 [`ConfigError`]，不与数据访问错误混用。

use thiserror::Error;

/// 越界访问的稳定错误码。
pub const CODE_OUT_OF_RANGE: &str = "buffer.out_of_range";
/// 违反调用契约（例如跨缓冲求游标距离）的稳定错误码。
pub const CODE_INVALID_OPERATION: &str = "buffer.invalid_operation";
/// 渲染配置非法的稳定错误码。
pub const CODE_INVALID_CONFIG: &str = "buffer.config.invalid";

/// 分片链缓冲的访问期错误。
///
/// # 教案式说明
/// - **意图 (Why)**：读越界必须让调用方可察觉，因此同步返回显式错误，而不是返回零字节或无效值。
/// - **契约 (What)**：
///   - 所有变体均为 `Clone + Eq`，便于测试中直接断言；
///   - [`BufferError::code`] 返回的错误码在版本间保持稳定；
///   - 两个越界变体都满足 [`BufferError::is_out_of_range`]。
/// - **设计权衡 (Trade-offs)**：游标越界单独成型并携带相对位移，牺牲一个枚举分支换取排障时的上下文完整性。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BufferError {
    /// 按逻辑偏移读取字节时越过缓冲末尾。
    ///
    /// - `offset`：请求的逻辑偏移（分片内访问时为分片内偏移）；
    /// - `length`：被访问对象的逻辑长度。
    ///
    /// 游标解引用越界报告的是 [`BufferError::CursorOutOfRange`]；只关心“是否越界”的调用方
    /// 应使用 [`BufferError::is_out_of_range`] 或 [`BufferError::code`]，而不是匹配具体变体。
    #[error("offset {offset} is out of range for {length} readable bytes")]
    OutOfRange { offset: usize, length: usize },

    /// 游标解引用或相对读取落在缓冲之外。
    ///
    /// - `position`：游标当前的逻辑位置；
    /// - `delta`：相对位移，解引用时为 0；
    /// - `length`：缓冲逻辑长度。
    #[error("cursor at {position} with delta {delta} is outside of {length} readable bytes")]
    CursorOutOfRange {
        position: usize,
        delta: isize,
        length: usize,
    },

    /// 调用方违反操作契约，例如对不同缓冲实例上的游标求差。
    #[error("invalid operation `{operation}`: {detail}")]
    InvalidOperation {
        operation: &'static str,
        detail: &'static str,
    },
}

impl BufferError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            BufferError::OutOfRange { .. } | BufferError::CursorOutOfRange { .. } => {
                CODE_OUT_OF_RANGE
            }
            BufferError::InvalidOperation { .. } => CODE_INVALID_OPERATION,
        }
    }

    /// 判断是否属于越界访问类错误。
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            BufferError::OutOfRange { .. } | BufferError::CursorOutOfRange { .. }
        )
    }

    pub(crate) fn cross_chain(operation: &'static str) -> Self {
        BufferError::InvalidOperation {
            operation,
            detail: "cursors belong to different chain instances",
        }
    }
}

/// 渲染配置加载错误。
///
/// # 教案式说明
/// - **意图 (Why)**：配置来自外部文本，语法错误与取值错误需要区分，方便运维定位是格式问题还是语义问题。
/// - **契约 (What)**：`Parse` 保留 `toml` 的原始错误；`Invalid` 指明字段名与原因。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 语法或类型不匹配。
    #[error("failed to parse render config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 字段取值不满足约束。
    #[error("invalid render config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        CODE_INVALID_CONFIG
    }
}
