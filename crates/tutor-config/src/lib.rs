pub mod config;
pub mod manager;

pub use config::{
    Config, ConfigError, ConfigResult, LogLevel, LoggingConfig, StorageConfig, StorageType,
    TutorSettings,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Tutor 配置目录路径
pub fn tutor_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tutor"))
}

/// 初始化 Tutor 目录结构
pub async fn init_tutor_dirs() -> ConfigResult<()> {
    if let Some(tutor) = tutor_dir() {
        tokio::fs::create_dir_all(tutor.join("history")).await?;
        tokio::fs::create_dir_all(tutor.join("logs")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutor_dir() {
        let dir = tutor_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".tutor"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.tutor/config.json").unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));

        let plain = expand_tilde("/var/tmp/tutor").unwrap();
        assert_eq!(plain, PathBuf::from("/var/tmp/tutor"));
    }
}
