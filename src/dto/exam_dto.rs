use crate::engine::scoring::AnswerReview;
use crate::engine::session::ExamOutcome;
use crate::models::exam::ExamType;
use crate::models::exam_result::ExamResult;
use crate::models::locale::LocalizedText;
use crate::models::question::{Difficulty, LocalizedOptions, Question, QuestionKind};
use crate::services::exam_service::{SessionStatusView, StartedExam};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct StartExamRequest {
    pub exam_type: ExamType,
    pub topic_id: Option<i32>,
}

/// Question as shown while an exam is running: no correct answer, no
/// explanation. Those only come back with the graded result.
#[derive(Debug, Clone, Serialize)]
pub struct ExamQuestionView {
    pub index: usize,
    pub topic_id: i32,
    #[serde(rename = "type")]
    pub question_type: &'static str,
    pub prompt: LocalizedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<LocalizedOptions>,
    pub difficulty: Difficulty,
}

impl ExamQuestionView {
    fn from_question(index: usize, question: &Question) -> Self {
        let options = match &question.kind {
            QuestionKind::MultipleChoice { options, .. } => Some(options.clone()),
            QuestionKind::TrueFalse { .. } => None,
        };
        Self {
            index,
            topic_id: question.topic_id,
            question_type: question.kind.type_str(),
            prompt: question.prompt.clone(),
            options,
            difficulty: question.difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartExamResponse {
    pub exam_id: Uuid,
    pub exam_type: ExamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub questions: Vec<ExamQuestionView>,
}

impl From<StartedExam> for StartExamResponse {
    fn from(started: StartedExam) -> Self {
        let questions = started
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| ExamQuestionView::from_question(index, q))
            .collect();
        Self {
            exam_id: started.exam_id,
            exam_type: started.exam_type,
            topic_id: started.topic_id,
            started_at: started.started_at,
            duration_seconds: started.duration_seconds,
            questions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    pub question_index: usize,
    pub option_index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagRequest {
    pub question_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagResponse {
    pub question_index: usize,
    pub flagged: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamStatusResponse {
    pub status: &'static str,
    pub remaining_seconds: i64,
    pub answered_questions: usize,
    pub total_questions: usize,
    pub flagged: Vec<usize>,
}

impl From<SessionStatusView> for ExamStatusResponse {
    fn from(view: SessionStatusView) -> Self {
        Self {
            status: view.status.as_str(),
            remaining_seconds: view.remaining_seconds,
            answered_questions: view.answered_questions,
            total_questions: view.total_questions,
            flagged: view.flagged,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitExamResponse {
    pub exam_id: Uuid,
    pub status: &'static str,
    pub score: i32,
    pub correct: i32,
    pub incorrect: i32,
    pub total: i32,
    pub time_spent_seconds: i64,
    pub results: Vec<AnswerReview>,
}

impl From<ExamOutcome> for SubmitExamResponse {
    fn from(outcome: ExamOutcome) -> Self {
        Self {
            exam_id: outcome.exam_id,
            status: outcome.status.as_str(),
            score: outcome.summary.score,
            correct: outcome.summary.correct,
            incorrect: outcome.summary.incorrect,
            total: outcome.summary.total,
            time_spent_seconds: outcome.time_spent_seconds,
            results: outcome.reviews,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamResultView {
    pub id: Uuid,
    pub exam_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<i32>,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_spent_seconds: i32,
    pub completed_at: DateTime<Utc>,
}

impl From<ExamResult> for ExamResultView {
    fn from(result: ExamResult) -> Self {
        Self {
            id: result.id,
            exam_type: result.exam_type,
            topic_id: result.topic_id,
            score: result.score,
            correct_answers: result.correct_answers,
            total_questions: result.total_questions,
            time_spent_seconds: result.time_spent_seconds,
            completed_at: result.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamHistoryResponse {
    pub exams: Vec<ExamResultView>,
    pub total: i64,
}
