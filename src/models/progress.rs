use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate view over a user's full exam history. Always derived from
/// `exam_results`; never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub completed_questions: i32,
    pub total_questions: i32,
    pub average_score: f64,
    pub topic_scores: HashMap<i32, f64>,
}
