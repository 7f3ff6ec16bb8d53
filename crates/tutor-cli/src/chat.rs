//! 交互式聊天

use std::io::{self, Write};

use colored::Colorize;
use tracing::Instrument;
use tutor_core::{PendingReply, Topic, TutorController, LEARNING_TIPS};
use tutor_observability::{create_session_span, LogManager};

use crate::render;

const HELP: &str = "\
/new               开始新对话
/topic <name|none> 设置提问主题
/quick <topic>     快速提问
/history           查看聊天记录
/select <n|id>     切换到聊天记录中的对话
/clear             清空全部聊天记录
/tips              学习小贴士
/log <level>       调整日志级别
/help              显示帮助
exit | quit        退出";

pub async fn run_interactive_chat(
    tutor: &mut TutorController,
    logs: &mut LogManager,
    debug: bool,
) -> anyhow::Result<()> {
    println!("{}", "🎓 AI 编程家教".cyan().bold());
    println!("{}", format!("Session ID: {}", tutor.active_session_id()).dimmed());
    println!("{}", "Type /help for commands, 'exit' or 'quit' to leave".dimmed());

    if debug {
        eprintln!(
            "{}",
            format!("[DEBUG] {} sessions in history", tutor.history().len()).dimmed()
        );
    }

    println!();
    render::print_topics();
    println!();

    loop {
        let prompt = match tutor.topic() {
            Some(topic) => format!("You [{}]:", topic),
            None => "You:".to_string(),
        };
        print!("{} ", prompt.cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if let Err(e) = run_command(tutor, logs, command).await {
                println!("{}", format!("❌ {}", e).red());
            }
        } else if let Some(pending) = tutor.submit(input).await {
            deliver(tutor, pending).await;
        }

        println!();
    }

    Ok(())
}

async fn run_command(
    tutor: &mut TutorController,
    logs: &mut LogManager,
    command: &str,
) -> anyhow::Result<()> {
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "new" => {
            tutor.new_session();
            println!("{}", format!("✨ 新对话 {}", tutor.active_session_id()).green());
        }
        "topic" => {
            let topic = match arg {
                "" | "none" => None,
                name => Some(name.parse::<Topic>()?),
            };
            tutor.set_topic(topic);
            match topic {
                Some(topic) => println!("{}", format!("主题: {}", topic).green()),
                None => println!("{}", "已清除主题".green()),
            }
        }
        "quick" => {
            let topic: Topic = arg.parse()?;
            let prompt = topic.quick_prompt();
            println!("{} {}", "You:".cyan().bold(), prompt.prompt);
            if let Some(pending) = tutor.quick_prompt(topic).await {
                deliver(tutor, pending).await;
            }
        }
        "history" => {
            let summaries = tutor.summaries();
            render::print_summaries(&summaries, Some(tutor.active_session_id()));
        }
        "select" => {
            let id = resolve_session_id(tutor, arg)?;
            tutor.select_session(&id)?;
            render::print_session(tutor.session());
        }
        "clear" => {
            tutor.clear_all().await;
            println!("{}", "🗑  聊天记录已清空".green());
        }
        "tips" => render::print_tips(&LEARNING_TIPS),
        "log" => {
            if arg.is_empty() {
                println!("{}", format!("日志级别: {}", logs.config().level).green());
            } else {
                logs.update_level(arg)?;
                println!("{}", format!("日志级别已调整为 {}", arg).green());
            }
        }
        "help" => println!("{}", HELP),
        other => anyhow::bail!("Unknown command: /{}", other),
    }

    Ok(())
}

/// 序号按 /history 的顺序从 1 开始，其余输入按会话 ID 处理
fn resolve_session_id(tutor: &TutorController, arg: &str) -> anyhow::Result<String> {
    if arg.is_empty() {
        anyhow::bail!("Usage: /select <n|id>");
    }

    match arg.parse::<usize>() {
        Ok(index) if index >= 1 => tutor
            .history()
            .get(index - 1)
            .map(|session| session.id.clone())
            .ok_or_else(|| anyhow::anyhow!("No session at position {}", index)),
        _ => Ok(arg.to_string()),
    }
}

async fn deliver(tutor: &mut TutorController, pending: PendingReply) {
    let span = create_session_span(
        pending.session_id(),
        pending.topic().map(|topic| topic.as_str()),
    );

    println!("{}", "Tutor is thinking...".dimmed());

    async {
        if let Some(ready) = pending.wait().await {
            let message = ready.message().clone();
            if tutor.complete(ready).await {
                render::print_message(&message);
            }
        }
    }
    .instrument(span)
    .await;
}
