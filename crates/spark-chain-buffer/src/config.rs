//! 诊断渲染配置。
//!
//! # 模块定位（Why）
//! - 分片链的文本转储只是排障辅助，但大缓冲直接全量输出会淹没日志；
//!   通过一份可从 TOML 加载的配置控制预览长度与转义策略。
//!
//! # 契约说明（What）
//! - 所有字段均带默认值，缺省字段按 [`RenderConfig::default`] 补齐；
//! - 未知字段视为配置错误，防止拼写错误被静默忽略；
//! - `max_preview_bytes` 必须大于 0。

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认每个分片最多预览的字节数。
pub const DEFAULT_MAX_PREVIEW_BYTES: usize = 64;

/// 分片链诊断转储的渲染选项。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// 每个分片最多输出的字节数，超出部分以省略标记代替。
    pub max_preview_bytes: usize,
    /// 是否按 [`core::ascii::escape_default`] 转义预览：不可打印字节写作 `\xNN`，
    /// 换行、制表、引号与反斜杠写作 `\n`、`\t`、`\"`、`\\`。
    pub escape_non_printable: bool,
    /// 是否输出分片在区域中的窗口范围。
    pub show_offsets: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_preview_bytes: DEFAULT_MAX_PREVIEW_BYTES,
            escape_non_printable: true,
            show_offsets: true,
        }
    }
}

impl RenderConfig {
    /// 从 TOML 文本解析并校验配置。
    ///
    /// # Errors
    /// 语法/类型错误返回 [`ConfigError::Parse`]，取值非法返回 [`ConfigError::Invalid`]。
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验字段取值。
    ///
    /// # Errors
    /// `max_preview_bytes == 0` 时返回 [`ConfigError::Invalid`]。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_preview_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_preview_bytes",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = RenderConfig::from_toml_str("show_offsets = false").expect("合法配置");
        assert_eq!(config.max_preview_bytes, DEFAULT_MAX_PREVIEW_BYTES);
        assert!(config.escape_non_printable);
        assert!(!config.show_offsets);
        assert_eq!(RenderConfig::from_toml_str("").expect("空配置"), RenderConfig::default());
    }

    #[test]
    fn zero_preview_is_rejected() {
        let err = RenderConfig::from_toml_str("max_preview_bytes = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_preview_bytes",
                ..
            }
        ));
        assert_eq!(err.code(), crate::error::CODE_INVALID_CONFIG);
    }

    #[test]
    fn unknown_or_mistyped_fields_fail_to_parse() {
        assert!(matches!(
            RenderConfig::from_toml_str("max_preview = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("show_offsets = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
