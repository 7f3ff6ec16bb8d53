//! 提问主题与快速提问

use serde::{Deserialize, Serialize};

/// 提问主题，决定回复模板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// 基础概念
    Basics,
    /// 代码调试
    Debug,
    /// 练习建议
    Practice,
    /// 创意激发
    Creative,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Basics, Topic::Debug, Topic::Practice, Topic::Creative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Basics => "basics",
            Topic::Debug => "debug",
            Topic::Practice => "practice",
            Topic::Creative => "creative",
        }
    }

    /// 对应的快速提问
    pub fn quick_prompt(&self) -> &'static QuickPrompt {
        match self {
            Topic::Basics => &QUICK_PROMPTS[0],
            Topic::Debug => &QUICK_PROMPTS[1],
            Topic::Practice => &QUICK_PROMPTS[2],
            Topic::Creative => &QUICK_PROMPTS[3],
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的主题名
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl std::str::FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basics" => Ok(Topic::Basics),
            "debug" => Ok(Topic::Debug),
            "practice" => Ok(Topic::Practice),
            "creative" => Ok(Topic::Creative),
            _ => Err(UnknownTopic(s.to_string())),
        }
    }
}

/// 快速提问：选中主题并发送预设问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickPrompt {
    pub topic: Topic,
    pub title: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const QUICK_PROMPTS: [QuickPrompt; 4] = [
    QuickPrompt {
        topic: Topic::Basics,
        title: "基础概念",
        description: "理解创意编程的核心概念",
        prompt: "请解释创意编程中的基础概念",
    },
    QuickPrompt {
        topic: Topic::Debug,
        title: "代码调试",
        description: "帮助解决代码问题",
        prompt: "我的代码有问题，能帮我检查一下吗",
    },
    QuickPrompt {
        topic: Topic::Practice,
        title: "练习建议",
        description: "获取针对性的练习建议",
        prompt: "推荐一些练习项目",
    },
    QuickPrompt {
        topic: Topic::Creative,
        title: "创意激发",
        description: "获取创意项目灵感",
        prompt: "给我一些创意项目的灵感",
    },
];

/// 学习建议
pub const LEARNING_TIPS: [&str; 4] = [
    "从基础概念开始，逐步深入",
    "多动手实践，创建小项目",
    "遇到问题时及时提问",
    "参考优秀作品获取灵感",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topic() {
        assert_eq!("basics".parse::<Topic>().unwrap(), Topic::Basics);
        assert_eq!(" Creative ".parse::<Topic>().unwrap(), Topic::Creative);
        assert!("history".parse::<Topic>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for topic in Topic::ALL {
            assert_eq!(topic.to_string().parse::<Topic>().unwrap(), topic);
        }
    }

    #[test]
    fn test_quick_prompt_matches_topic() {
        for topic in Topic::ALL {
            assert_eq!(topic.quick_prompt().topic, topic);
        }
    }
}
