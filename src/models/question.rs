use crate::error::{Error, Result};
use crate::models::locale::LocalizedText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Option lists for a multiple-choice question, one list per language.
/// Both lists describe the same options in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedOptions {
    pub es: Vec<String>,
    pub en: Vec<String>,
}

/// True/false questions carry no option list: their answer space is fixed to
/// {0, 1} (0 = true) by the variant itself. The client renders the
/// Verdadero/True and Falso/False labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: LocalizedOptions,
        correct_option: u32,
    },
    TrueFalse {
        answer: bool,
    },
}

impl QuestionKind {
    pub fn type_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::TrueFalse { .. } => "true_false",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub topic_id: i32,
    pub prompt: LocalizedText,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub explanation: LocalizedText,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Number of selectable answer indexes.
    pub fn answer_space(&self) -> u32 {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => options.es.len() as u32,
            QuestionKind::TrueFalse { .. } => 2,
        }
    }

    /// Index of the correct answer within the answer space.
    pub fn correct_index(&self) -> u32 {
        match &self.kind {
            QuestionKind::MultipleChoice { correct_option, .. } => *correct_option,
            QuestionKind::TrueFalse { answer } => {
                if *answer {
                    0
                } else {
                    1
                }
            }
        }
    }

    pub fn is_correct(&self, selected: u32) -> bool {
        selected == self.correct_index()
    }

    /// Enforces the question invariants, naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if crate::models::topic::get(self.topic_id).is_none() {
            return Err(Error::Validation(format!(
                "topic_id: unknown topic {}",
                self.topic_id
            )));
        }
        if let Some(locale) = self.prompt.missing_locale() {
            return Err(Error::Validation(format!(
                "prompt.{}: text must be provided in both languages",
                locale.as_str()
            )));
        }
        if let Some(locale) = self.explanation.missing_locale() {
            return Err(Error::Validation(format!(
                "explanation.{}: text must be provided in both languages",
                locale.as_str()
            )));
        }
        if let QuestionKind::MultipleChoice {
            options,
            correct_option,
        } = &self.kind
        {
            if options.es.len() != options.en.len() {
                return Err(Error::Validation(format!(
                    "options: option lists differ in length (es={}, en={})",
                    options.es.len(),
                    options.en.len()
                )));
            }
            if options.es.len() < 2 {
                return Err(Error::Validation(
                    "options: at least two options are required".to_string(),
                ));
            }
            if options.es.iter().chain(options.en.iter()).any(|o| o.trim().is_empty()) {
                return Err(Error::Validation(
                    "options: options must not be blank".to_string(),
                ));
            }
            if *correct_option as usize >= options.es.len() {
                return Err(Error::Validation(format!(
                    "correct_option: index {} is outside the {} available options",
                    correct_option,
                    options.es.len()
                )));
            }
        }
        Ok(())
    }
}

/// `questions` table row. Filterable columns are typed; the full bilingual
/// question lives in `body`.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub topic_id: i32,
    pub question_type: String,
    pub difficulty: String,
    pub body: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl QuestionRow {
    pub fn into_question(self) -> Result<Question> {
        serde_json::from_value(self.body).map_err(Error::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locale::LocalizedText;

    fn base_multiple_choice() -> Question {
        Question {
            id: Uuid::new_v4(),
            topic_id: 5,
            prompt: LocalizedText::new("¿Cuándo podar?", "When to prune?"),
            kind: QuestionKind::MultipleChoice {
                options: LocalizedOptions {
                    es: vec!["Invierno".into(), "Verano".into(), "Nunca".into()],
                    en: vec!["Winter".into(), "Summer".into(), "Never".into()],
                },
                correct_option: 0,
            },
            explanation: LocalizedText::new("Durante el reposo", "During dormancy"),
            difficulty: Difficulty::Medium,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn valid_question_passes() {
        assert!(base_multiple_choice().validate().is_ok());
    }

    #[test]
    fn correct_option_out_of_range_is_rejected() {
        let mut q = base_multiple_choice();
        if let QuestionKind::MultipleChoice { correct_option, .. } = &mut q.kind {
            *correct_option = 3;
        }
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("correct_option"));
    }

    #[test]
    fn missing_locale_is_rejected_with_field_name() {
        let mut q = base_multiple_choice();
        q.prompt = LocalizedText::new("", "When to prune?");
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("prompt.es"));

        let mut q = base_multiple_choice();
        q.explanation = LocalizedText::new("Durante el reposo", "  ");
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("explanation.en"));
    }

    #[test]
    fn mismatched_option_lists_are_rejected() {
        let mut q = base_multiple_choice();
        if let QuestionKind::MultipleChoice { options, .. } = &mut q.kind {
            options.en.pop();
        }
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("options"));
    }

    #[test]
    fn unknown_topic_is_rejected() {
        let mut q = base_multiple_choice();
        q.topic_id = 42;
        let err = q.validate().unwrap_err();
        assert!(err.to_string().contains("topic_id"));
    }

    #[test]
    fn true_false_answer_space_is_fixed() {
        let q = Question {
            id: Uuid::new_v4(),
            topic_id: 1,
            prompt: LocalizedText::new("¿Las raíces respiran?", "Do roots respire?"),
            kind: QuestionKind::TrueFalse { answer: true },
            explanation: LocalizedText::new("Sí, intercambian gases", "Yes, they exchange gases"),
            difficulty: Difficulty::Easy,
            created_at: Utc::now(),
        };
        assert!(q.validate().is_ok());
        assert_eq!(q.answer_space(), 2);
        assert_eq!(q.correct_index(), 0);
        assert!(q.is_correct(0));
        assert!(!q.is_correct(1));
    }

    #[test]
    fn serde_shape_is_type_tagged() {
        let q = base_multiple_choice();
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "multiple_choice");
        assert!(value["options"]["es"].is_array());

        let tf = serde_json::json!({
            "id": Uuid::new_v4(),
            "topic_id": 1,
            "prompt": {"es": "¿?", "en": "?"},
            "type": "true_false",
            "answer": false,
            "explanation": {"es": "x", "en": "y"},
            "difficulty": "hard",
            "created_at": Utc::now(),
        });
        let parsed: Question = serde_json::from_value(tf).unwrap();
        assert_eq!(parsed.correct_index(), 1);
    }
}
