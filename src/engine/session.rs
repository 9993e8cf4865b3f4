use crate::engine::scoring::{self, AnswerReview, ScoreSummary};
use crate::engine::selection::config_for;
use crate::error::{Error, Result};
use crate::models::exam::ExamType;
use crate::models::question::Question;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Submitted,
    TimedOut,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Submitted => "submitted",
            SessionStatus::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

/// Everything produced by a finished session, ready to be persisted as an
/// `exam_results` row and returned to the student for review.
#[derive(Debug, Clone, Serialize)]
pub struct ExamOutcome {
    pub exam_id: Uuid,
    pub user_id: Uuid,
    pub exam_type: ExamType,
    pub topic_id: Option<i32>,
    pub summary: ScoreSummary,
    pub reviews: Vec<AnswerReview>,
    pub answered_question_ids: Vec<Uuid>,
    pub time_spent_seconds: i64,
    pub status: SessionStatus,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Still running; seconds left on the clock.
    InProgress { remaining_seconds: i64 },
    /// The deadline passed on this tick; the session auto-submitted with the
    /// answers recorded so far.
    TimedOut(Box<ExamOutcome>),
    /// Already in a terminal state; nothing to do.
    Finished,
}

/// One timed exam attempt. Lives only in the in-process registry; the only
/// trace it leaves is the ExamResult written when it finishes.
///
/// State machine: `in_progress -> submitted | timed_out`, both terminal.
/// Finalization happens exactly once, by explicit submit or by `tick`
/// crossing the deadline, never both.
#[derive(Debug, Clone)]
pub struct ExamSession {
    pub exam_id: Uuid,
    pub user_id: Uuid,
    pub exam_type: ExamType,
    pub topic_id: Option<i32>,
    pub questions: Vec<Question>,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub answers: HashMap<usize, u32>,
    pub flagged: BTreeSet<usize>,
    pub status: SessionStatus,
}

impl ExamSession {
    pub fn new(
        user_id: Uuid,
        exam_type: ExamType,
        topic_id: Option<i32>,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exam_id: Uuid::new_v4(),
            user_id,
            exam_type,
            topic_id,
            questions,
            started_at,
            duration_seconds: config_for(exam_type).duration_seconds,
            answers: HashMap::new(),
            flagged: BTreeSet::new(),
            status: SessionStatus::InProgress,
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::seconds(self.duration_seconds)
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.deadline() - now).num_seconds().max(0)
    }

    /// Records (or overwrites) the answer for one question. Out-of-range
    /// indexes are contract violations, never clamped.
    pub fn select_answer(&mut self, question_index: usize, option_index: u32) -> Result<()> {
        self.ensure_in_progress()?;
        let question = self.questions.get(question_index).ok_or_else(|| {
            Error::Validation(format!(
                "question_index: {} is outside this exam's {} questions",
                question_index,
                self.questions.len()
            ))
        })?;
        if option_index >= question.answer_space() {
            return Err(Error::Validation(format!(
                "option_index: {} is outside the question's {} answers",
                option_index,
                question.answer_space()
            )));
        }
        self.answers.insert(question_index, option_index);
        Ok(())
    }

    /// Toggles the review marker on a question. Returns whether the question
    /// is flagged afterwards. Flags never affect scoring.
    pub fn toggle_flag(&mut self, question_index: usize) -> Result<bool> {
        self.ensure_in_progress()?;
        if question_index >= self.questions.len() {
            return Err(Error::Validation(format!(
                "question_index: {} is outside this exam's {} questions",
                question_index,
                self.questions.len()
            )));
        }
        if self.flagged.remove(&question_index) {
            Ok(false)
        } else {
            self.flagged.insert(question_index);
            Ok(true)
        }
    }

    /// Advances the session clock. Crossing the deadline finalizes the
    /// session with whatever answers were recorded; once terminal this is a
    /// no-op reporting `Finished`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.status.is_terminal() {
            return TickOutcome::Finished;
        }
        if now < self.deadline() {
            return TickOutcome::InProgress {
                remaining_seconds: self.remaining_seconds(now),
            };
        }
        let outcome = self.finalize(now, SessionStatus::TimedOut);
        TickOutcome::TimedOut(Box::new(outcome))
    }

    /// Explicit submission. A second submit (or a submit after the timer
    /// already fired) is rejected, so at most one ExamResult can ever come
    /// out of a session.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<ExamOutcome> {
        self.ensure_in_progress()?;
        let status = if now >= self.deadline() {
            SessionStatus::TimedOut
        } else {
            SessionStatus::Submitted
        };
        Ok(self.finalize(now, status))
    }

    /// Rolls a just-finalized session back to `in_progress`. Called only when
    /// persisting the result failed, so the caller can retry; the registry
    /// lock is held across finalize-persist-rollback.
    pub(crate) fn reopen(&mut self) {
        self.status = SessionStatus::InProgress;
    }

    fn finalize(&mut self, now: DateTime<Utc>, status: SessionStatus) -> ExamOutcome {
        let (summary, reviews) = scoring::grade(&self.questions, &self.answers);
        let answered_question_ids = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, _)| self.answers.contains_key(i))
            .map(|(_, q)| q.id)
            .collect();
        let time_spent = (now - self.started_at)
            .num_seconds()
            .clamp(0, self.duration_seconds);
        let completed_at = if status == SessionStatus::TimedOut {
            self.deadline().min(now)
        } else {
            now
        };
        self.status = status;
        ExamOutcome {
            exam_id: self.exam_id,
            user_id: self.user_id,
            exam_type: self.exam_type,
            topic_id: self.topic_id,
            summary,
            reviews,
            answered_question_ids,
            time_spent_seconds: time_spent,
            status,
            completed_at,
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::State(format!(
                "Exam is already {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locale::LocalizedText;
    use crate::models::question::{Difficulty, LocalizedOptions, QuestionKind};

    fn multiple_choice(correct_option: u32) -> Question {
        Question {
            id: Uuid::new_v4(),
            topic_id: 5,
            prompt: LocalizedText::new("¿?", "?"),
            kind: QuestionKind::MultipleChoice {
                options: LocalizedOptions {
                    es: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    en: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                },
                correct_option,
            },
            explanation: LocalizedText::new("exp", "exp"),
            difficulty: Difficulty::Medium,
            created_at: Utc::now(),
        }
    }

    fn topic_session(correct_options: &[u32]) -> ExamSession {
        let questions = correct_options.iter().map(|c| multiple_choice(*c)).collect();
        ExamSession::new(Uuid::new_v4(), ExamType::Topic, Some(5), questions, Utc::now())
    }

    #[test]
    fn answers_overwrite_and_score_counts_exact_matches() {
        // 10 questions; 4 of them have index 1 as the correct answer.
        let key = [1u32, 0, 1, 2, 1, 3, 0, 1, 2, 3];
        let mut session = topic_session(&key);
        for i in 0..10 {
            session.select_answer(i, 1).unwrap();
        }
        let outcome = session.submit(session.started_at + Duration::seconds(30)).unwrap();
        assert_eq!(outcome.summary.score, 40);
        assert_eq!(outcome.summary.correct, 4);
        assert_eq!(outcome.summary.incorrect, 6);
        assert_eq!(outcome.summary.total, 10);
        assert_eq!(outcome.status, SessionStatus::Submitted);
        assert_eq!(outcome.answered_question_ids.len(), 10);
    }

    #[test]
    fn answer_overwrites_previous_selection() {
        let mut session = topic_session(&[2, 2]);
        session.select_answer(0, 0).unwrap();
        session.select_answer(0, 2).unwrap();
        assert_eq!(session.answers.get(&0), Some(&2));
        assert_eq!(session.answers.len(), 1);
    }

    #[test]
    fn out_of_range_answers_are_rejected_not_clamped() {
        let mut session = topic_session(&[0]);
        assert!(matches!(
            session.select_answer(5, 0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            session.select_answer(0, 4),
            Err(Error::Validation(_))
        ));
        assert!(session.answers.is_empty());
    }

    #[test]
    fn flag_toggle_is_pairwise_idempotent_and_cosmetic() {
        let mut session = topic_session(&[0, 0, 0]);
        assert!(session.toggle_flag(1).unwrap());
        assert!(!session.toggle_flag(1).unwrap());
        assert!(session.toggle_flag(1).unwrap());
        assert!(matches!(session.toggle_flag(9), Err(Error::Validation(_))));

        session.select_answer(0, 0).unwrap();
        let outcome = session.submit(session.started_at + Duration::seconds(1)).unwrap();
        // One correct of three regardless of flags.
        assert_eq!(outcome.summary.correct, 1);
    }

    #[test]
    fn double_submit_is_rejected() {
        let mut session = topic_session(&[0, 1]);
        let now = session.started_at + Duration::seconds(10);
        session.submit(now).unwrap();
        let err = session.submit(now + Duration::seconds(1)).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn tick_before_deadline_reports_remaining_time() {
        let mut session = topic_session(&[0]);
        let now = session.started_at + Duration::seconds(100);
        match session.tick(now) {
            TickOutcome::InProgress { remaining_seconds } => {
                assert_eq!(remaining_seconds, 500)
            }
            other => panic!("unexpected tick outcome: {:?}", other),
        }
        assert_eq!(session.status, SessionStatus::InProgress);
    }

    #[test]
    fn tick_past_deadline_times_out_with_recorded_answers() {
        let mut session = topic_session(&[1, 1, 0, 0]);
        session.select_answer(0, 1).unwrap();
        session.select_answer(1, 0).unwrap();

        let late = session.started_at + Duration::seconds(session.duration_seconds + 30);
        let outcome = match session.tick(late) {
            TickOutcome::TimedOut(outcome) => outcome,
            other => panic!("unexpected tick outcome: {:?}", other),
        };
        assert_eq!(session.status, SessionStatus::TimedOut);
        assert_eq!(outcome.status, SessionStatus::TimedOut);
        assert_eq!(outcome.summary.correct, 1);
        assert_eq!(outcome.summary.total, 4);
        assert_eq!(outcome.time_spent_seconds, session.duration_seconds);
        assert_eq!(outcome.completed_at, session.deadline());
        assert_eq!(outcome.answered_question_ids.len(), 2);
    }

    #[test]
    fn tick_is_idempotent_once_terminal() {
        let mut session = topic_session(&[0]);
        let late = session.started_at + Duration::seconds(601);
        assert!(matches!(session.tick(late), TickOutcome::TimedOut(_)));
        assert!(matches!(session.tick(late), TickOutcome::Finished));
        assert!(matches!(
            session.tick(late + Duration::seconds(60)),
            TickOutcome::Finished
        ));
    }

    #[test]
    fn submit_after_timeout_tick_is_rejected() {
        let mut session = topic_session(&[0]);
        let late = session.started_at + Duration::seconds(601);
        assert!(matches!(session.tick(late), TickOutcome::TimedOut(_)));
        assert!(matches!(session.submit(late), Err(Error::State(_))));
    }

    #[test]
    fn answering_a_finished_session_is_a_state_error() {
        let mut session = topic_session(&[0, 0]);
        session.submit(session.started_at + Duration::seconds(1)).unwrap();
        assert!(matches!(session.select_answer(0, 0), Err(Error::State(_))));
        assert!(matches!(session.toggle_flag(0), Err(Error::State(_))));
    }

    #[test]
    fn late_explicit_submit_counts_as_timed_out_and_caps_time_spent() {
        let mut session = topic_session(&[0]);
        session.select_answer(0, 0).unwrap();
        let late = session.started_at + Duration::seconds(session.duration_seconds + 120);
        let outcome = session.submit(late).unwrap();
        assert_eq!(outcome.status, SessionStatus::TimedOut);
        assert_eq!(outcome.time_spent_seconds, session.duration_seconds);
        assert_eq!(outcome.summary.score, 100);
    }

    #[test]
    fn reopen_allows_retry_after_failed_persistence() {
        let mut session = topic_session(&[0]);
        let now = session.started_at + Duration::seconds(5);
        session.submit(now).unwrap();
        session.reopen();
        let outcome = session.submit(now + Duration::seconds(1)).unwrap();
        assert_eq!(outcome.status, SessionStatus::Submitted);
    }

    #[test]
    fn question_order_is_stable_for_the_session() {
        let session = topic_session(&[0, 1, 2, 3]);
        let ids: Vec<Uuid> = session.questions.iter().map(|q| q.id).collect();
        let again: Vec<Uuid> = session.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, again);
    }
}
