//! 终端输出

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use tutor_core::{Message, Role, Session, SessionSummary, QUICK_PROMPTS};

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn print_message(message: &Message) {
    match message.role {
        Role::User => println!("{} {}", "You:".cyan().bold(), message.text),
        Role::Assistant => {
            println!("{}", "Tutor:".green().bold());
            println!("{}", message.text);
        }
    }

    if let Some(code) = &message.code_sample {
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", code.yellow());
        println!("{}", "─".repeat(50).dimmed());
    }
}

pub fn print_session(session: &Session) {
    let title = if session.title.is_empty() {
        "新对话"
    } else {
        session.title.as_str()
    };
    println!("{}", format!("📖 {}", title).cyan().bold());
    println!(
        "{}",
        format!("Session ID: {} · {}", session.id, local_time(&session.last_updated_at)).dimmed()
    );
    println!();

    for message in session.messages() {
        print_message(message);
        println!();
    }
}

/// 按最近更新排列的记录列表，序号从 1 开始
pub fn print_summaries(summaries: &[SessionSummary], active_id: Option<&str>) {
    if summaries.is_empty() {
        println!("{}", "暂无聊天记录".dimmed());
        return;
    }

    println!("{}", "🕘 聊天记录".cyan().bold());
    for (index, summary) in summaries.iter().enumerate() {
        let marker = if Some(summary.id.as_str()) == active_id {
            "▶".green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:>2}. {}  {}",
            marker,
            index + 1,
            summary.title,
            format!(
                "({} 条消息, {})",
                summary.message_count,
                local_time(&summary.last_updated_at)
            )
            .dimmed()
        );
        println!("      {}", summary.id.dimmed());
    }
}

pub fn print_topics() {
    println!("{}", "⚡ 快速提问".cyan().bold());
    for prompt in QUICK_PROMPTS.iter() {
        println!(
            "  {:<9} {} {}",
            prompt.topic.as_str().yellow(),
            prompt.title.bold(),
            format!("· {}", prompt.description).dimmed()
        );
    }
}

pub fn print_tips(tips: &[&str]) {
    println!("{}", "💡 学习小贴士".cyan().bold());
    for tip in tips {
        println!("  • {}", tip);
    }
}
