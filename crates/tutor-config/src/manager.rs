use crate::config::{Config, ConfigError, ConfigResult, StorageType};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, info};
use tutor_core::{validate_key, Topic};

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

/// 配置管理器
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// 加载配置文件，不存在时写入默认配置
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            Self::read_config(path).await?
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = Config::default();
            write_config(path, &default_config).await?;
            default_config
        };

        Ok(Self {
            path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 创建一个新的配置管理器（用于测试）
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置的共享引用
    pub fn get(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// 当前配置的快照
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    /// 保存配置到文件
    pub async fn save(&self) -> ConfigResult<()> {
        self.save_to(&self.path).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 保存配置到指定路径
    pub async fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config = self.config.read().await.clone();
        write_config(path, &config).await
    }

    /// 重新加载配置
    pub async fn reload(&self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::InvalidPath(format!(
                "Config file not found: {:?}",
                self.path
            )));
        }

        let new_config = Self::read_config(&self.path).await?;
        *self.config.write().await = new_config;

        info!("Config reloaded from {:?}", self.path);
        Ok(())
    }

    /// 更新配置并保存
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        {
            let mut config = self.config.write().await;
            let mut candidate = config.clone();
            f(&mut candidate);
            Self::validate(&candidate)?;
            *config = candidate;
        }
        self.save().await
    }

    /// 验证配置
    pub fn validate(config: &Config) -> ConfigResult<()> {
        // 主题名和存储键沿用会话层的解析规则
        if let Some(topic) = &config.tutor.default_topic {
            topic.parse::<Topic>().map_err(|_| {
                ConfigError::Validation(format!("Unknown default topic '{}'", topic))
            })?;
        }

        validate_key(&config.storage.key).map_err(|_| {
            ConfigError::Validation(format!("Invalid storage key '{}'", config.storage.key))
        })?;

        if config.storage.storage_type == StorageType::File && config.storage.path.is_none() {
            return Err(ConfigError::Validation(
                "File storage requires storage.path".to_string(),
            ));
        }

        Ok(())
    }

    async fn read_config(path: &Path) -> ConfigResult<Config> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::expand_env_vars(&content)?;
        let config: Config = serde_json::from_str(&content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// 展开环境变量 ${VAR} 或 ${VAR:-default}
    pub fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let mut result = content.to_string();

        for cap in env_var_pattern().captures_iter(content) {
            let full_match = &cap[0];
            let var_expr = &cap[1];

            let (var_name, default_value) = match var_expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr, None),
            };

            let replacement = match (std::env::var(var_name), default_value) {
                (Ok(val), _) => val,
                (Err(_), Some(default)) => default.to_string(),
                (Err(_), None) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
            };

            debug!("Expanded config variable {}", var_name);
            result = result.replace(full_match, &replacement);
        }

        Ok(result)
    }

    /// 获取配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn write_config(path: &Path, config: &Config) -> ConfigResult<()> {
    let content = serde_json::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_creates_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        let config = manager.snapshot().await;

        assert!(config_path.exists());
        assert_eq!(config.tutor.reply_delay_ms, 1000);
        assert_eq!(config.storage.key, "ai_tutor_history");
    }

    #[tokio::test]
    async fn test_update_persists_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        manager
            .update(|config| {
                config.tutor.reply_delay_ms = 10;
                config.logging.level = LogLevel::Debug;
            })
            .await
            .unwrap();

        let reopened = ConfigManager::load(&config_path).await.unwrap();
        let config = reopened.snapshot().await;
        assert_eq!(config.tutor.reply_delay_ms, 10);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        let result = manager
            .update(|config| config.storage.key = "../escape".to_string())
            .await;

        assert!(result.is_err());
        assert_eq!(manager.snapshot().await.storage.key, "ai_tutor_history");
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_edit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        let mut edited = Config::default();
        edited.storage.storage_type = StorageType::Memory;
        tokio::fs::write(&config_path, serde_json::to_string(&edited).unwrap())
            .await
            .unwrap();

        manager.reload().await.unwrap();
        assert_eq!(manager.snapshot().await.storage.storage_type, StorageType::Memory);
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("TUTOR_TEST_HISTORY_DIR", "/tmp/tutor-history");

        let content = r#"{"path": "${TUTOR_TEST_HISTORY_DIR}", "key": "${TUTOR_TEST_UNSET_KEY:-fallback}"}"#;
        let expanded = ConfigManager::expand_env_vars(content).unwrap();

        assert!(expanded.contains("/tmp/tutor-history"));
        assert!(expanded.contains("fallback"));
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let err = ConfigManager::expand_env_vars(r#"{"key": "${TUTOR_TEST_NEVER_SET}"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "TUTOR_TEST_NEVER_SET"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(ConfigManager::validate(&config).is_ok());

        config.tutor.default_topic = Some("history".to_string());
        assert!(ConfigManager::validate(&config).is_err());

        config.tutor.default_topic = Some("debug".to_string());
        config.storage.path = None;
        assert!(ConfigManager::validate(&config).is_err());

        config.storage.storage_type = StorageType::Memory;
        assert!(ConfigManager::validate(&config).is_ok());
    }

    #[test]
    fn test_validation_accepts_every_topic() {
        let mut config = Config::default();
        for topic in Topic::ALL {
            config.tutor.default_topic = Some(topic.as_str().to_string());
            assert!(ConfigManager::validate(&config).is_ok(), "topic {}", topic);
        }
    }

    #[test]
    fn test_validation_matches_store_key_rules() {
        let mut config = Config::default();
        // 与存储层 validate_key 的判定保持一致
        for key in ["ai_tutor_history", "tutor-2", "", "a b", "../escape", "a/b", "键"] {
            config.storage.key = key.to_string();
            assert_eq!(
                ConfigManager::validate(&config).is_ok(),
                validate_key(key).is_ok(),
                "key {:?}",
                key
            );
        }
    }
}
