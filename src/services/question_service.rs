use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionRow};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insertion-ordered listing for browsing and admin views. Selection and
    /// shuffling for exams happen in the engine, never here.
    pub async fn list(
        &self,
        topic_id: Option<i32>,
        difficulty: Option<String>,
        limit: i64,
    ) -> Result<(Vec<Question>, i64)> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, topic_id, question_type, difficulty, body, created_at
            FROM questions
            WHERE ($1::int IS NULL OR topic_id = $1)
              AND ($2::text IS NULL OR difficulty = $2)
            ORDER BY created_at ASC
            LIMIT $3
            "#,
        )
        .bind(topic_id)
        .bind(difficulty.clone())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM questions
            WHERE ($1::int IS NULL OR topic_id = $1)
              AND ($2::text IS NULL OR difficulty = $2)
            "#,
        )
        .bind(topic_id)
        .bind(difficulty)
        .fetch_one(&self.pool)
        .await?;

        let questions = rows
            .into_iter()
            .map(QuestionRow::into_question)
            .collect::<Result<Vec<_>>>()?;
        Ok((questions, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, topic_id, question_type, difficulty, body, created_at
            FROM questions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Question {} not found", id)))?;
        row.into_question()
    }

    /// Every candidate question for a new exam session, optionally filtered
    /// to one topic. Ordering does not matter here; the engine shuffles.
    pub async fn bank_for_exam(&self, topic_id: Option<i32>) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, topic_id, question_type, difficulty, body, created_at
            FROM questions
            WHERE ($1::int IS NULL OR topic_id = $1)
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QuestionRow::into_question).collect()
    }

    /// Validates and stores a new question. Invariant violations abort
    /// before any write with a message naming the offending field.
    pub async fn create(&self, question: Question) -> Result<Question> {
        question.validate()?;
        let body = serde_json::to_value(&question)?;
        sqlx::query(
            r#"
            INSERT INTO questions (id, topic_id, question_type, difficulty, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(question.id)
        .bind(question.topic_id)
        .bind(question.kind.type_str())
        .bind(question.difficulty.as_str())
        .bind(body)
        .bind(question.created_at)
        .execute(&self.pool)
        .await?;
        Ok(question)
    }

    pub async fn update(&self, question: Question) -> Result<Question> {
        question.validate()?;
        let body = serde_json::to_value(&question)?;
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET topic_id = $2, question_type = $3, difficulty = $4, body = $5
            WHERE id = $1
            "#,
        )
        .bind(question.id)
        .bind(question.topic_id)
        .bind(question.kind.type_str())
        .bind(question.difficulty.as_str())
        .bind(body)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Question {} not found", question.id)));
        }
        Ok(question)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Question {} not found", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn count_by_topic(&self) -> Result<HashMap<i32, i64>> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT topic_id, COUNT(*) FROM questions GROUP BY topic_id ORDER BY topic_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
