use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Practice,
    Full,
    Topic,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Practice => "practice",
            ExamType::Full => "full",
            ExamType::Topic => "topic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "practice" => Some(ExamType::Practice),
            "full" => Some(ExamType::Full),
            "topic" => Some(ExamType::Topic),
            _ => None,
        }
    }
}
