use crate::engine::registry::{SessionRegistry, Sessions};
use crate::engine::selection;
use crate::engine::session::{ExamOutcome, ExamSession, SessionStatus, TickOutcome};
use crate::error::{Error, Result};
use crate::models::exam::ExamType;
use crate::models::exam_result::ExamResult;
use crate::models::question::Question;
use crate::services::progress_service;
use crate::services::question_service::QuestionService;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Snapshot handed back when a session starts. The question order shown here
/// is the order kept for the whole attempt.
#[derive(Debug, Clone)]
pub struct StartedExam {
    pub exam_id: Uuid,
    pub exam_type: ExamType,
    pub topic_id: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct SessionStatusView {
    pub status: SessionStatus,
    pub remaining_seconds: i64,
    pub answered_questions: usize,
    pub total_questions: usize,
    pub flagged: Vec<usize>,
}

/// Drives the full life cycle of timed exam attempts: selection on start,
/// answer/flag bookkeeping, deadline enforcement and exactly-once result
/// recording.
#[derive(Clone)]
pub struct ExamService {
    pool: PgPool,
    questions: QuestionService,
    sessions: Arc<SessionRegistry>,
}

impl ExamService {
    pub fn new(pool: PgPool, sessions: Arc<SessionRegistry>) -> Self {
        let questions = QuestionService::new(pool.clone());
        Self {
            pool,
            questions,
            sessions,
        }
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        exam_type: ExamType,
        topic_id: Option<i32>,
    ) -> Result<StartedExam> {
        let bank_filter = match exam_type {
            ExamType::Topic => topic_id,
            _ => None,
        };
        let bank = self.questions.bank_for_exam(bank_filter).await?;
        let selected =
            selection::select_questions(bank, exam_type, topic_id, &mut rand::thread_rng())?;

        let session = ExamSession::new(
            user_id,
            exam_type,
            topic_id,
            selected,
            crate::utils::time::now(),
        );
        let started = StartedExam {
            exam_id: session.exam_id,
            exam_type,
            topic_id,
            started_at: session.started_at,
            duration_seconds: session.duration_seconds,
            questions: session.questions.clone(),
        };

        let mut guard = self.sessions.lock().await;
        if let Some(discarded) = guard.insert(session) {
            // Abandoned attempt: dropped without recording a result.
            tracing::info!(
                "Discarding previous {} session {} for user {}",
                discarded.status.as_str(),
                discarded.exam_id,
                user_id
            );
        }

        tracing::info!(
            "Started {} exam {} for user {} ({} questions, {}s)",
            exam_type.as_str(),
            started.exam_id,
            user_id,
            started.questions.len(),
            started.duration_seconds
        );
        Ok(started)
    }

    pub async fn select_answer(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        question_index: usize,
        option_index: u32,
    ) -> Result<()> {
        let mut guard = self.sessions.lock().await;
        let now = crate::utils::time::now();
        self.settle_if_expired(&mut guard, exam_id, user_id, now)
            .await?;
        let session = owned_session(&mut guard, exam_id, user_id)?;
        session.select_answer(question_index, option_index)
    }

    pub async fn toggle_flag(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        question_index: usize,
    ) -> Result<bool> {
        let mut guard = self.sessions.lock().await;
        let now = crate::utils::time::now();
        self.settle_if_expired(&mut guard, exam_id, user_id, now)
            .await?;
        let session = owned_session(&mut guard, exam_id, user_id)?;
        session.toggle_flag(question_index)
    }

    pub async fn status(&self, user_id: Uuid, exam_id: Uuid) -> Result<SessionStatusView> {
        let mut guard = self.sessions.lock().await;
        let now = crate::utils::time::now();
        self.settle_if_expired(&mut guard, exam_id, user_id, now)
            .await?;
        let session = owned_session(&mut guard, exam_id, user_id)?;
        Ok(SessionStatusView {
            status: session.status,
            remaining_seconds: if session.status.is_terminal() {
                0
            } else {
                session.remaining_seconds(now)
            },
            answered_questions: session.answers.len(),
            total_questions: session.questions.len(),
            flagged: session.flagged.iter().copied().collect(),
        })
    }

    /// Explicit submission. Submitting after the deadline records the
    /// attempt as timed out; submitting a finished session is a state error
    /// and never produces a second result.
    pub async fn submit(&self, user_id: Uuid, exam_id: Uuid) -> Result<ExamOutcome> {
        let mut guard = self.sessions.lock().await;
        let now = crate::utils::time::now();
        let session = owned_session(&mut guard, exam_id, user_id)?;
        let outcome = session.submit(now)?;

        if let Err(err) = self.record_outcome(&outcome).await {
            if let Some(session) = guard.get_mut(exam_id) {
                session.reopen();
            }
            return Err(err);
        }

        tracing::info!(
            "Exam {} {} for user {}: score {}",
            exam_id,
            outcome.status.as_str(),
            user_id,
            outcome.summary.score
        );
        Ok(outcome)
    }

    /// Sweeper entry point: times out every overdue session and records the
    /// partial results. Returns how many sessions were settled.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut guard = self.sessions.lock().await;
        let mut settled = 0usize;
        for exam_id in guard.live_exam_ids() {
            let Some(session) = guard.get_mut(exam_id) else {
                continue;
            };
            let TickOutcome::TimedOut(outcome) = session.tick(now) else {
                continue;
            };
            match self.record_outcome(&outcome).await {
                Ok(()) => {
                    settled += 1;
                    tracing::info!(
                        "Timed out exam {} for user {} with score {}",
                        exam_id,
                        outcome.user_id,
                        outcome.summary.score
                    );
                }
                Err(err) => {
                    tracing::error!("Failed to record timed-out exam {}: {:?}", exam_id, err);
                    if let Some(session) = guard.get_mut(exam_id) {
                        session.reopen();
                    }
                }
            }
        }
        Ok(settled)
    }

    pub async fn history(&self, user_id: Uuid, limit: i64) -> Result<(Vec<ExamResult>, i64)> {
        let results = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, user_id, exam_type, topic_id, score, correct_answers,
                   total_questions, time_spent_seconds, answered_question_ids, completed_at
            FROM exam_results
            WHERE user_id = $1
            ORDER BY completed_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_results WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((results, total))
    }

    /// Ticks a session before serving an operation against it; an expired
    /// session is recorded (exactly once) before the caller sees the error.
    async fn settle_if_expired(
        &self,
        guard: &mut Sessions,
        exam_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let session = owned_session(guard, exam_id, user_id)?;
        if let TickOutcome::TimedOut(outcome) = session.tick(now) {
            if let Err(err) = self.record_outcome(&outcome).await {
                if let Some(session) = guard.get_mut(exam_id) {
                    session.reopen();
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Writes the ExamResult row and the recomputed progress in one
    /// transaction, so stored progress can never drift from history.
    async fn record_outcome(&self, outcome: &ExamOutcome) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO exam_results (
                id, user_id, exam_type, topic_id, score, correct_answers,
                total_questions, time_spent_seconds, answered_question_ids, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(outcome.user_id)
        .bind(outcome.exam_type.as_str())
        .bind(outcome.topic_id)
        .bind(outcome.summary.score)
        .bind(outcome.summary.correct)
        .bind(outcome.summary.total)
        .bind(outcome.time_spent_seconds as i32)
        .bind(serde_json::to_value(&outcome.answered_question_ids)?)
        .bind(outcome.completed_at)
        .execute(&mut *tx)
        .await?;

        let history = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, user_id, exam_type, topic_id, score, correct_answers,
                   total_questions, time_spent_seconds, answered_question_ids, completed_at
            FROM exam_results WHERE user_id = $1
            "#,
        )
        .bind(outcome.user_id)
        .fetch_all(&mut *tx)
        .await?;

        let bank_size: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&mut *tx)
            .await?;

        let progress = progress_service::recompute(&history, bank_size);
        sqlx::query(
            r#"
            INSERT INTO user_progress (
                user_id, completed_questions, total_questions, average_score,
                topic_scores, updated_at
            ) VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                completed_questions = EXCLUDED.completed_questions,
                total_questions = EXCLUDED.total_questions,
                average_score = EXCLUDED.average_score,
                topic_scores = EXCLUDED.topic_scores,
                updated_at = NOW()
            "#,
        )
        .bind(outcome.user_id)
        .bind(progress.completed_questions)
        .bind(progress.total_questions)
        .bind(progress.average_score)
        .bind(serde_json::to_value(&progress.topic_scores)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn owned_session<'a>(
    guard: &'a mut Sessions,
    exam_id: Uuid,
    user_id: Uuid,
) -> Result<&'a mut ExamSession> {
    let session = guard
        .get_mut(exam_id)
        .ok_or_else(|| Error::NotFound("Exam session not found".to_string()))?;
    if session.user_id != user_id {
        // Do not leak other users' sessions.
        return Err(Error::NotFound("Exam session not found".to_string()));
    }
    Ok(session)
}
