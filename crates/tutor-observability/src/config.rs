//! 日志输出配置

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 终端输出是否带颜色
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// 是否输出 target
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// 日志文件路径，None 表示只输出到 stderr
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            ansi_colors: true,
            include_target: true,
            file_path: None,
            module_levels: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// 设置日志级别
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// 设置日志文件
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// 设置模块日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.module_levels.insert(module.into(), level.into());
        self
    }
}

impl From<&tutor_config::LoggingConfig> for LoggingConfig {
    fn from(config: &tutor_config::LoggingConfig) -> Self {
        Self {
            level: config.level.to_string(),
            json_format: config.json,
            ansi_colors: !config.json,
            include_target: true,
            file_path: config
                .file
                .as_deref()
                .and_then(tutor_config::expand_tilde),
            module_levels: config.module_levels.clone(),
        }
    }
}
