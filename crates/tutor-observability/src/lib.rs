//! # Tutor Observability
//!
//! 统一的日志初始化。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use tutor_observability::init_from_config;
//!
//! let config = tutor_config::Config::default();
//! let _logs = init_from_config(&config.logging, false).await?;
//! tracing::info!("tutor started");
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::LoggingConfig;
pub use error::{ObservabilityError, Result};
pub use logging::{create_session_span, LogManager};

/// 根据 tutor 配置初始化日志，`debug` 为 true 时强制使用 debug 级别
pub async fn init_from_config(
    config: &tutor_config::LoggingConfig,
    debug: bool,
) -> Result<LogManager> {
    let mut logging = LoggingConfig::from(config);
    if debug {
        logging.level = "debug".to_string();
    }
    LogManager::new(logging).await
}
