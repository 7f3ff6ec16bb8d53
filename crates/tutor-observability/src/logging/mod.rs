//! 结构化日志模块
//!
//! 基于 tracing 的日志初始化：stderr 输出、可选的文件输出以及运行时调整日志级别。

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Directive,
    layer::{Layered, SubscriberExt},
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// 日志管理器
///
/// 文件输出通过后台线程写入，管理器被丢弃时刷新剩余日志。
pub struct LogManager {
    config: LoggingConfig,
    reload_handle: Option<ReloadHandle>,
    file_guard: Option<WorkerGuard>,
}

impl LogManager {
    /// 创建并安装全局日志订阅者
    pub async fn new(config: LoggingConfig) -> Result<Self> {
        let mut manager = Self {
            config,
            reload_handle: None,
            file_guard: None,
        };

        manager.init()?;

        Ok(manager)
    }

    fn init(&mut self) -> Result<()> {
        if self.reload_handle.is_some() {
            return Ok(());
        }

        let filter = build_filter(&self.config.level, &self.config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let mut layers: Vec<BoxedLayer> = vec![self.stderr_layer()];
        if let Some(layer) = self.file_layer()? {
            layers.push(layer);
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(layers)
            .try_init()
            .map_err(|e| ObservabilityError::logging(format!("Failed to install subscriber: {}", e)))?;

        self.reload_handle = Some(reload_handle);

        tracing::info!(
            target: "tutor_observability",
            "Log manager initialized with level: {}",
            self.config.level
        );

        Ok(())
    }

    fn stderr_layer(&self) -> BoxedLayer {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(self.config.include_target);

        if self.config.json_format {
            layer.json().boxed()
        } else {
            layer.with_ansi(self.config.ansi_colors).boxed()
        }
    }

    fn file_layer(&mut self) -> Result<Option<BoxedLayer>> {
        let Some(path) = self.config.file_path.as_ref() else {
            return Ok(None);
        };

        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.to_path_buf())
            .unwrap_or_else(|| std::path::PathBuf::from("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| ObservabilityError::config(format!("Invalid log file path: {:?}", path)))?;

        std::fs::create_dir_all(&directory)?;

        let appender = tracing_appender::rolling::never(&directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        self.file_guard = Some(guard);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(self.config.include_target);

        Ok(Some(if self.config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        }))
    }

    /// 动态更新日志级别
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = build_filter(level, &self.config)?;

        let handle = self
            .reload_handle
            .as_ref()
            .ok_or_else(|| ObservabilityError::logging("Log manager not initialized"))?;

        handle
            .modify(|filter| *filter = new_filter)
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config.level = level.to_string();

        tracing::info!(
            target: "tutor_observability",
            "Log level updated to: {}",
            level
        );

        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// 是否写入日志文件
    pub fn writes_to_file(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// 构建环境过滤器，模块级别覆盖全局级别
fn build_filter(level: &str, config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| ObservabilityError::config(format!("Invalid log level: {}", e)))?;

    for (module, module_level) in &config.module_levels {
        let directive = format!("{}={}", module, module_level)
            .parse::<Directive>()
            .map_err(|e| ObservabilityError::config(format!("Invalid directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

/// 创建带有会话上下文的 span
pub fn create_session_span(session_id: &str, topic: Option<&str>) -> tracing::Span {
    if let Some(topic) = topic {
        tracing::info_span!(
            "session",
            session_id = %session_id,
            topic = %topic,
        )
    } else {
        tracing::info_span!(
            "session",
            session_id = %session_id,
        )
    }
}
