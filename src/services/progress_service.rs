use crate::error::Result;
use crate::models::exam_result::ExamResult;
use crate::models::progress::UserProgress;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Derives a user's aggregate progress from their full result history.
/// Pure and idempotent: the same history always yields the same progress.
///
/// `bank_size` is the current number of questions on the platform and only
/// feeds the progress-bar denominator.
pub fn recompute(results: &[ExamResult], bank_size: i64) -> UserProgress {
    let completed_questions: i32 = results.iter().map(|r| r.total_questions).sum();

    let average_score = if results.is_empty() {
        0.0
    } else {
        let sum: i64 = results.iter().map(|r| r.score as i64).sum();
        round1(sum as f64 / results.len() as f64)
    };

    // Mean of all attempts per topic, not the best one: repeat visits to a
    // weak topic should move the needle both ways.
    let mut per_topic: HashMap<i32, (i64, i64)> = HashMap::new();
    for result in results {
        if let Some(topic_id) = result.topic_id {
            let entry = per_topic.entry(topic_id).or_insert((0, 0));
            entry.0 += result.score as i64;
            entry.1 += 1;
        }
    }
    let topic_scores = per_topic
        .into_iter()
        .map(|(topic_id, (sum, count))| (topic_id, round1(sum as f64 / count as f64)))
        .collect();

    UserProgress {
        completed_questions,
        total_questions: bank_size as i32,
        average_score,
        topic_scores,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stored progress row; defaults for users with no finished exams. The
    /// row is maintained transactionally with every result insert, so it is
    /// always consistent with the exam_results history.
    pub async fn get(&self, user_id: Uuid) -> Result<UserProgress> {
        let row: Option<(i32, i32, f64, serde_json::Value)> = sqlx::query_as(
            r#"
            SELECT completed_questions, total_questions, average_score, topic_scores
            FROM user_progress WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((completed_questions, total_questions, average_score, topic_scores)) => {
                Ok(UserProgress {
                    completed_questions,
                    total_questions,
                    average_score,
                    topic_scores: serde_json::from_value(topic_scores)?,
                })
            }
            None => {
                let bank_size: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
                    .fetch_one(&self.pool)
                    .await?;
                Ok(UserProgress {
                    total_questions: bank_size as i32,
                    ..UserProgress::default()
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(topic_id: Option<i32>, score: i32, total_questions: i32) -> ExamResult {
        ExamResult {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            exam_type: if topic_id.is_some() { "topic" } else { "practice" }.to_string(),
            topic_id,
            score,
            correct_answers: 0,
            total_questions,
            time_spent_seconds: 60,
            answered_question_ids: serde_json::json!([]),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_yields_defaults() {
        let progress = recompute(&[], 250);
        assert_eq!(progress.completed_questions, 0);
        assert_eq!(progress.total_questions, 250);
        assert_eq!(progress.average_score, 0.0);
        assert!(progress.topic_scores.is_empty());
    }

    #[test]
    fn average_is_mean_of_all_scores() {
        let history = vec![
            result(None, 80, 8),
            result(None, 60, 8),
            result(Some(5), 70, 10),
        ];
        let progress = recompute(&history, 100);
        assert_eq!(progress.average_score, 70.0);
        assert_eq!(progress.completed_questions, 26);
    }

    #[test]
    fn topic_scores_are_mean_of_attempts_for_that_topic() {
        let history = vec![
            result(Some(5), 40, 10),
            result(Some(5), 80, 10),
            result(Some(9), 90, 10),
            result(None, 10, 8),
        ];
        let progress = recompute(&history, 100);
        assert_eq!(progress.topic_scores.get(&5), Some(&60.0));
        assert_eq!(progress.topic_scores.get(&9), Some(&90.0));
        assert_eq!(progress.topic_scores.len(), 2);
    }

    #[test]
    fn recompute_is_idempotent() {
        let history = vec![
            result(Some(1), 33, 10),
            result(Some(1), 67, 10),
            result(None, 50, 8),
        ];
        let first = recompute(&history, 120);
        let second = recompute(&history, 120);
        assert_eq!(first, second);
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let history = vec![result(None, 33, 8), result(None, 33, 8), result(None, 34, 8)];
        let progress = recompute(&history, 100);
        assert_eq!(progress.average_score, 33.3);
    }
}
