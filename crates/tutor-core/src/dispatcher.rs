//! 回复分发
//!
//! `ResponseDispatcher` 是接入真实推理服务的接缝。当前实现 `CannedDispatcher`
//! 只根据主题返回固定回复，不分析用户输入。

use tutor_session::Message;

use crate::topic::Topic;

/// 回复分发器
///
/// 调用方负责过滤空白输入、模拟延迟以及把回复追加到会话中。分发本身不会失败。
pub trait ResponseDispatcher: Send + Sync {
    fn dispatch(&self, user_text: &str, topic: Option<Topic>) -> Message;
}

/// 回复模板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedReply {
    pub text: &'static str,
    pub code_sample: Option<&'static str>,
}

const BASICS_REPLY: CannedReply = CannedReply {
    text: "创意编程的核心概念包括：\n1. 图形绘制\n2. 动画原理\n3. 交互设计\n4. 算法思维",
    code_sample: Some(
        "// 基本图形绘制示例\nsize(400, 400);\nbackground(255);\nellipse(200, 200, 50, 50);",
    ),
};

const DEBUG_REPLY: CannedReply = CannedReply {
    text: "让我帮你检查代码。通常出现问题的几个常见原因：\n1. 语法错误\n2. 逻辑错误\n3. 初始化问题",
    code_sample: None,
};

const PRACTICE_REPLY: CannedReply = CannedReply {
    text: "这里有一些很好的练习项目建议：\n1. 创建一个简单的画板\n2. 制作一个粒子系统\n3. 实现一个简单的游戏",
    code_sample: Some(
        "// 简单画板示例\nvoid draw() {\n  if (mousePressed) {\n    line(pmouseX, pmouseY, mouseX, mouseY);\n  }\n}",
    ),
};

const CREATIVE_REPLY: CannedReply = CannedReply {
    text: "这些创意项目可能会激发你的灵感：\n1. 音乐可视化\n2. 生成艺术\n3. 互动装置",
    code_sample: None,
};

const DEFAULT_REPLY: CannedReply = CannedReply {
    text: "我来帮你解答这个问题。让我们一步步分析...",
    code_sample: None,
};

/// 固定回复分发器
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedDispatcher;

impl CannedDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// 主题对应的回复模板
    pub fn reply_for(topic: Option<Topic>) -> CannedReply {
        match topic {
            Some(Topic::Basics) => BASICS_REPLY,
            Some(Topic::Debug) => DEBUG_REPLY,
            Some(Topic::Practice) => PRACTICE_REPLY,
            Some(Topic::Creative) => CREATIVE_REPLY,
            None => DEFAULT_REPLY,
        }
    }
}

impl ResponseDispatcher for CannedDispatcher {
    fn dispatch(&self, _user_text: &str, topic: Option<Topic>) -> Message {
        let reply = Self::reply_for(topic);
        match reply.code_sample {
            Some(code) => Message::assistant_with_code(reply.text, code),
            None => Message::assistant(reply.text),
        }
    }
}
