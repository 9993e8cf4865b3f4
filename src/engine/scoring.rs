use crate::models::locale::LocalizedText;
use crate::models::question::Question;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-question review entry returned with a graded exam.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReview {
    pub question_id: Uuid,
    pub question_index: usize,
    pub selected_option: Option<u32>,
    pub correct_option: u32,
    pub is_correct: bool,
    pub explanation: LocalizedText,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub score: i32,
    pub correct: i32,
    pub incorrect: i32,
    pub total: i32,
}

/// Grades by exact index match. An unanswered question counts as incorrect;
/// it is reported with `selected_option: None`.
pub fn grade(
    questions: &[Question],
    answers: &HashMap<usize, u32>,
) -> (ScoreSummary, Vec<AnswerReview>) {
    let mut correct = 0usize;
    let mut reviews = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        let selected = answers.get(&index).copied();
        let is_correct = selected.map(|s| question.is_correct(s)).unwrap_or(false);
        if is_correct {
            correct += 1;
        }
        reviews.push(AnswerReview {
            question_id: question.id,
            question_index: index,
            selected_option: selected,
            correct_option: question.correct_index(),
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    let total = questions.len();
    let score = if total == 0 {
        0
    } else {
        (100.0 * correct as f64 / total as f64).round() as i32
    };

    (
        ScoreSummary {
            score,
            correct: correct as i32,
            incorrect: (total - correct) as i32,
            total: total as i32,
        },
        reviews,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locale::LocalizedText;
    use crate::models::question::{Difficulty, LocalizedOptions, QuestionKind};
    use chrono::Utc;

    fn multiple_choice(correct_option: u32) -> Question {
        Question {
            id: Uuid::new_v4(),
            topic_id: 1,
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

    #[test]
    fn seven_of_ten_scores_seventy() {
        let questions: Vec<Question> = (0..10).map(|_| multiple_choice(2)).collect();
        let mut answers = HashMap::new();
        for i in 0..7 {
            answers.insert(i, 2);
        }
        for i in 7..10 {
            answers.insert(i, 0);
        }
        let (summary, reviews) = grade(&questions, &answers);
        assert_eq!(summary.score, 70);
        assert_eq!(summary.correct, 7);
        assert_eq!(summary.incorrect, 3);
        assert_eq!(summary.total, 10);
        assert_eq!(reviews.len(), 10);
    }

    #[test]
    fn missing_answers_count_as_incorrect() {
        let questions: Vec<Question> = (0..4).map(|_| multiple_choice(1)).collect();
        let mut answers = HashMap::new();
        answers.insert(0, 1);
        let (summary, reviews) = grade(&questions, &answers);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 3);
        assert_eq!(summary.score, 25);
        assert_eq!(reviews[3].selected_option, None);
        assert!(!reviews[3].is_correct);
    }

    #[test]
    fn true_false_grades_on_fixed_index_space() {
        let q = Question {
            kind: QuestionKind::TrueFalse { answer: false },
            ..multiple_choice(0)
        };
        let questions = vec![q];
        let mut answers = HashMap::new();
        answers.insert(0usize, 1u32); // 1 = false
        let (summary, _) = grade(&questions, &answers);
        assert_eq!(summary.score, 100);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // 1 of 3 correct = 33.33... -> 33; 2 of 3 = 66.66... -> 67
        let questions: Vec<Question> = (0..3).map(|_| multiple_choice(0)).collect();
        let mut answers = HashMap::new();
        answers.insert(0, 0);
        let (summary, _) = grade(&questions, &answers);
        assert_eq!(summary.score, 33);

        answers.insert(1, 0);
        let (summary, _) = grade(&questions, &answers);
        assert_eq!(summary.score, 67);
    }

    #[test]
    fn empty_exam_scores_zero() {
        let (summary, reviews) = grade(&[], &HashMap::new());
        assert_eq!(summary.score, 0);
        assert_eq!(summary.total, 0);
        assert!(reviews.is_empty());
    }
}
