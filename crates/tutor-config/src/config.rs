use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tutor_core::Topic;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub tutor: TutorSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            tutor: TutorSettings::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["tutor", "reply_delay_ms"] => Some(self.tutor.reply_delay_ms.to_string()),
            ["tutor", "default_topic"] => Some(
                self.tutor
                    .default_topic
                    .clone()
                    .unwrap_or_else(|| "none".to_string()),
            ),
            ["storage", "type"] => Some(self.storage.storage_type.to_string()),
            ["storage", "path"] => self.storage.path.clone(),
            ["storage", "key"] => Some(self.storage.key.clone()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["tutor", "reply_delay_ms"] => {
                self.tutor.reply_delay_ms = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["tutor", "default_topic"] => {
                self.tutor.default_topic = match value.trim().to_lowercase().as_str() {
                    "" | "none" => None,
                    topic => {
                        let topic = topic
                            .parse::<Topic>()
                            .map_err(|e| ConfigError::Validation(e.to_string()))?;
                        Some(topic.as_str().to_string())
                    }
                };
            }
            ["storage", "type"] => {
                self.storage.storage_type = value.parse()?;
            }
            ["storage", "path"] => {
                self.storage.path = Some(value.to_string());
            }
            ["storage", "key"] => {
                self.storage.key = value.to_string();
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "json"] => {
                self.logging.json = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["logging", "file"] => {
                self.logging.file = match value {
                    "" | "none" => None,
                    path => Some(path.to_string()),
                };
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// 家教行为配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorSettings {
    /// 模拟回复延迟（毫秒）
    pub reply_delay_ms: u64,
    /// 新对话的默认主题
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_topic: Option<String>,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1000,
            default_topic: None,
        }
    }
}

/// Storage 类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    File,
    Memory,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::File => write!(f, "file"),
            StorageType::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageType::File),
            "memory" => Ok(StorageType::Memory),
            _ => Err(ConfigError::Validation(format!("Invalid storage type: {}", s))),
        }
    }
}

/// Storage 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// 文件存储目录
    pub path: Option<String>,
    /// 聊天记录使用的存储键
    #[serde(default = "default_history_key")]
    pub key: String,
}

fn default_history_key() -> String {
    "ai_tutor_history".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::File,
            path: Some("~/.tutor/history".to_string()),
            key: default_history_key(),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// 以 JSON 格式输出
    #[serde(default)]
    pub json: bool,
    /// 日志文件，None 表示只输出到 stderr
    #[serde(default)]
    pub file: Option<String>,
    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            json: false,
            file: None,
            module_levels: HashMap::new(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tutor.reply_delay_ms, 1000);
        assert_eq!(config.storage.storage_type, StorageType::File);
        assert_eq!(config.storage.key, "ai_tutor_history");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_get_and_set_values() {
        let mut config = Config::default();

        config.set_value("tutor.reply_delay_ms", "250").unwrap();
        config.set_value("tutor.default_topic", "Basics").unwrap();
        config.set_value("storage.type", "memory").unwrap();
        config.set_value("logging.level", "debug").unwrap();

        assert_eq!(config.get_value("tutor.reply_delay_ms").as_deref(), Some("250"));
        assert_eq!(config.get_value("tutor.default_topic").as_deref(), Some("basics"));
        assert_eq!(config.get_value("storage.type").as_deref(), Some("memory"));
        assert_eq!(config.get_value("logging.level").as_deref(), Some("debug"));

        config.set_value("tutor.default_topic", "none").unwrap();
        assert_eq!(config.get_value("tutor.default_topic").as_deref(), Some("none"));
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set_value("tutor.reply_delay_ms", "soon").is_err());
        assert!(config.set_value("tutor.default_topic", "history").is_err());
        assert!(config.set_value("storage.type", "sqlite").is_err());
        assert!(matches!(
            config.set_value("server.port", "8080"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"version": "0.1.0"}"#).unwrap();
        assert_eq!(config.tutor, TutorSettings::default());
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_storage_type_serialization() {
        let json = serde_json::to_value(StorageConfig::default()).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["key"], "ai_tutor_history");
    }
}
