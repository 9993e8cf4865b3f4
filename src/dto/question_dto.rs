use crate::models::locale::LocalizedText;
use crate::models::question::Question;
use crate::models::topic::Topic;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionListQuery {
    pub topic_id: Option<i32>,
    pub difficulty: Option<String>,
    pub limit: Option<i64>,
}

/// Study-mode listing: full questions, explanations included.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicView {
    pub id: i32,
    pub name: LocalizedText,
    pub weight: u32,
    pub description: LocalizedText,
}

impl From<&Topic> for TopicView {
    fn from(topic: &Topic) -> Self {
        Self {
            id: topic.id,
            name: topic.name.clone(),
            weight: topic.weight,
            description: topic.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicView>,
}
