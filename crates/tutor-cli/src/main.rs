use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tutor_config::{Config, ConfigManager, StorageType};
use tutor_core::{
    CannedDispatcher, FileStore, FileStoreConfig, HistoryManager, HistoryStore, MemoryStore,
    Topic, TutorController, TutorControllerConfig, LEARNING_TIPS,
};

mod chat;
mod render;

#[derive(Parser)]
#[command(name = "tutor")]
#[command(about = "AI programming tutor for the terminal")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = "TUTOR_CONFIG", default_value = "~/.tutor/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动交互式聊天
    Chat {
        /// 初始提问主题 (basics, debug, practice, creative)
        #[arg(long)]
        topic: Option<Topic>,
        /// 继续聊天记录中的对话
        #[arg(long)]
        session: Option<String>,
    },
    /// 发送单条消息并等待回复
    Ask {
        /// 消息内容
        message: String,
        /// 提问主题
        #[arg(long)]
        topic: Option<Topic>,
    },
    /// 快速提问
    Quick {
        /// 主题 (basics, debug, practice, creative)
        topic: Topic,
    },
    /// 查看聊天记录
    History {
        /// 以 JSON 输出
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// 显示一段对话
    Show {
        /// 会话 ID
        id: String,
    },
    /// 清空全部聊天记录
    Clear {
        /// 跳过确认
        #[arg(long, short, default_value = "false")]
        yes: bool,
    },
    /// 列出快速提问
    Topics,
    /// 学习小贴士
    Tips,
    /// 配置管理命令
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: tutor.reply_delay_ms, storage.type)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: tutor.reply_delay_ms, storage.type)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path =
        tutor_config::expand_tilde(&cli.config).unwrap_or_else(|| PathBuf::from(&cli.config));

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    let command = match cli.command {
        Commands::Config(args) => return handle_config(args, config_path).await,
        command => command,
    };

    let config = ConfigManager::load(&config_path).await?.snapshot().await;
    let mut logs = tutor_observability::init_from_config(&config.logging, cli.debug).await?;

    match command {
        Commands::Chat { topic, session } => {
            let mut tutor = build_controller(&config).await?;
            if let Some(id) = session {
                tutor.select_session(&id)?;
                render::print_session(tutor.session());
            }
            if topic.is_some() {
                tutor.set_topic(topic);
            }
            chat::run_interactive_chat(&mut tutor, &mut logs, cli.debug).await
        }
        Commands::Ask { message, topic } => {
            let mut tutor = build_controller(&config).await?;
            if topic.is_some() {
                tutor.set_topic(topic);
            }
            match tutor.ask(&message).await {
                Some(reply) => render::print_message(&reply),
                None => println!("{}", "❌ Message is empty".red()),
            }
            Ok(())
        }
        Commands::Quick { topic } => {
            let mut tutor = build_controller(&config).await?;
            println!("{} {}", "You:".cyan().bold(), topic.quick_prompt().prompt);
            if let Some(pending) = tutor.quick_prompt(topic).await {
                if let Some(ready) = pending.wait().await {
                    let message = ready.message().clone();
                    if tutor.complete(ready).await {
                        render::print_message(&message);
                    }
                }
            }
            Ok(())
        }
        Commands::History { json } => {
            let tutor = build_controller(&config).await?;
            let summaries = tutor.summaries();
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                render::print_summaries(&summaries, None);
            }
            Ok(())
        }
        Commands::Show { id } => {
            let mut tutor = build_controller(&config).await?;
            tutor.select_session(&id)?;
            render::print_session(tutor.session());
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes && !confirm("确定要清空全部聊天记录吗？")? {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            let mut tutor = build_controller(&config).await?;
            tutor.clear_all().await;
            println!("{}", "🗑  聊天记录已清空".green());
            Ok(())
        }
        Commands::Topics => {
            render::print_topics();
            Ok(())
        }
        Commands::Tips => {
            render::print_tips(&LEARNING_TIPS);
            Ok(())
        }
        Commands::Config(_) => Ok(()),
    }
}

/// 根据配置创建存储和控制器
async fn build_controller(config: &Config) -> anyhow::Result<TutorController> {
    let store: Arc<dyn HistoryStore> = match config.storage.storage_type {
        StorageType::File => {
            let store_config = match &config.storage.path {
                Some(path) => FileStoreConfig::new(path),
                None => FileStoreConfig::default(),
            };
            Arc::new(FileStore::new(store_config).await?)
        }
        StorageType::Memory => Arc::new(MemoryStore::new()),
    };
    store.health_check().await?;

    let default_topic = config
        .tutor
        .default_topic
        .as_deref()
        .map(str::parse::<Topic>)
        .transpose()?;

    let controller_config = TutorControllerConfig::default()
        .with_reply_delay(Duration::from_millis(config.tutor.reply_delay_ms))
        .with_default_topic(default_topic);

    let history = HistoryManager::new(store).with_key(config.storage.key.clone());

    Ok(TutorController::new(controller_config, history, Arc::new(CannedDispatcher::new())).await)
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    use std::io::{self, Write};

    print!("{} [y/N] ", question.yellow());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn handle_config(args: ConfigArgs, config_path: PathBuf) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(&config_path).await?;

            // 先在副本上校验，避免写入无效值
            let mut candidate = manager.snapshot().await;
            candidate.set_value(&key, &value)?;
            ConfigManager::validate(&candidate)?;

            manager.update(|config| *config = candidate).await?;
            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            tutor_config::init_tutor_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.clone());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
