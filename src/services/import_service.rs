use crate::error::{Error, Result};
use crate::models::locale::LocalizedText;
use crate::models::question::{Difficulty, LocalizedOptions, Question, QuestionKind};
use crate::services::question_service::QuestionService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// One parsed spreadsheet row. The admin front end owns the CSV/Excel
/// parsing; rows arrive here already split into fields. Option cells carry
/// pipe-separated lists, matching the downloadable template.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub topic_id: i32,
    #[serde(rename = "type")]
    pub question_type: String,
    pub question_es: String,
    pub question_en: String,
    #[serde(default)]
    pub options_es: Option<String>,
    #[serde(default)]
    pub options_en: Option<String>,
    pub correct_answer: JsonValue,
    pub explanation_es: String,
    pub explanation_en: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub imported_count: usize,
    pub error_count: usize,
    pub imported_questions: Vec<Question>,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct ImportService {
    questions: QuestionService,
}

impl ImportService {
    pub fn new(questions: QuestionService) -> Self {
        Self { questions }
    }

    /// Imports every valid row and reports the rest. A bad row never aborts
    /// the batch; its error is recorded with its 1-based row number and the
    /// import moves on.
    pub async fn bulk_import(&self, rows: Vec<ImportRow>) -> Result<ImportReport> {
        let now = crate::utils::time::now();
        let mut report = ImportReport::default();

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            let question = match row_to_question(row, now) {
                Ok(question) => question,
                Err(err) => {
                    report.errors.push(format!("Row {}: {}", row_number, err));
                    continue;
                }
            };
            match self.questions.create(question).await {
                Ok(question) => report.imported_questions.push(question),
                Err(err) => report.errors.push(format!("Row {}: {}", row_number, err)),
            }
        }

        report.imported_count = report.imported_questions.len();
        report.error_count = report.errors.len();
        tracing::info!(
            "Bulk import finished: {} imported, {} failed",
            report.imported_count,
            report.error_count
        );
        Ok(report)
    }
}

/// Builds a validated question from one row. All question invariants apply;
/// errors name the offending field.
pub fn row_to_question(row: &ImportRow, created_at: DateTime<Utc>) -> Result<Question> {
    let kind = match row.question_type.as_str() {
        "multiple_choice" => {
            let options_es = split_options(row.options_es.as_deref(), "options_es")?;
            let options_en = split_options(row.options_en.as_deref(), "options_en")?;
            let correct_option = row.correct_answer.as_u64().ok_or_else(|| {
                Error::Validation(
                    "correct_answer: expected an option index for multiple_choice".to_string(),
                )
            })? as u32;
            QuestionKind::MultipleChoice {
                options: LocalizedOptions {
                    es: options_es,
                    en: options_en,
                },
                correct_option,
            }
        }
        "true_false" => {
            let answer = match &row.correct_answer {
                JsonValue::Bool(b) => *b,
                // The template also allows the index form: 0 = true, 1 = false.
                JsonValue::Number(n) if n.as_u64() == Some(0) => true,
                JsonValue::Number(n) if n.as_u64() == Some(1) => false,
                _ => {
                    return Err(Error::Validation(
                        "correct_answer: expected true/false (or 0/1) for true_false".to_string(),
                    ))
                }
            };
            QuestionKind::TrueFalse { answer }
        }
        other => {
            return Err(Error::Validation(format!(
                "type: unknown question type '{}'",
                other
            )))
        }
    };

    let difficulty = match row.difficulty.as_deref() {
        None | Some("") => Difficulty::Medium,
        Some(value) => Difficulty::parse(value).ok_or_else(|| {
            Error::Validation(format!("difficulty: unknown difficulty '{}'", value))
        })?,
    };

    let question = Question {
        id: Uuid::new_v4(),
        topic_id: row.topic_id,
        prompt: LocalizedText::new(row.question_es.trim(), row.question_en.trim()),
        kind,
        explanation: LocalizedText::new(row.explanation_es.trim(), row.explanation_en.trim()),
        difficulty,
        created_at,
    };
    question.validate()?;
    Ok(question)
}

fn split_options(cell: Option<&str>, field: &str) -> Result<Vec<String>> {
    let cell = cell.filter(|c| !c.trim().is_empty()).ok_or_else(|| {
        Error::Validation(format!("{}: required for multiple_choice", field))
    })?;
    Ok(cell.split('|').map(|o| o.trim().to_string()).collect())
}

/// Template the admin UI offers for download next to the upload form.
pub fn csv_template() -> String {
    let mut template = String::from(
        "topic_id,type,question_es,question_en,options_es,options_en,correct_answer,explanation_es,explanation_en,difficulty\n",
    );
    template.push_str(
        "5,multiple_choice,¿Cuál es el mejor momento para podar?,When is the best time to prune?,Invierno|Primavera|Verano|Otoño,Winter|Spring|Summer|Fall,0,Durante el reposo vegetativo,During dormancy,medium\n",
    );
    template.push_str(
        "1,true_false,Las raíces de los árboles necesitan oxígeno,Tree roots need oxygen,,,true,Las raíces respiran e intercambian gases,Roots respire and exchange gases,easy\n",
    );
    template
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple_choice_row() -> ImportRow {
        ImportRow {
            topic_id: 5,
            question_type: "multiple_choice".to_string(),
            question_es: "¿Cuándo podar?".to_string(),
            question_en: "When to prune?".to_string(),
            options_es: Some("Invierno|Verano".to_string()),
            options_en: Some("Winter|Summer".to_string()),
            correct_answer: serde_json::json!(0),
            explanation_es: "En reposo".to_string(),
            explanation_en: "During dormancy".to_string(),
            difficulty: Some("hard".to_string()),
        }
    }

    #[test]
    fn multiple_choice_row_converts() {
        let q = row_to_question(&multiple_choice_row(), Utc::now()).unwrap();
        assert_eq!(q.topic_id, 5);
        assert_eq!(q.answer_space(), 2);
        assert_eq!(q.correct_index(), 0);
        assert_eq!(q.difficulty, Difficulty::Hard);
    }

    #[test]
    fn true_false_row_accepts_bool_and_index_forms() {
        let mut row = multiple_choice_row();
        row.question_type = "true_false".to_string();
        row.options_es = None;
        row.options_en = None;

        row.correct_answer = serde_json::json!(true);
        assert_eq!(row_to_question(&row, Utc::now()).unwrap().correct_index(), 0);

        row.correct_answer = serde_json::json!(1);
        assert_eq!(row_to_question(&row, Utc::now()).unwrap().correct_index(), 1);

        row.correct_answer = serde_json::json!("yes");
        assert!(row_to_question(&row, Utc::now()).is_err());
    }

    #[test]
    fn missing_options_are_reported_by_field() {
        let mut row = multiple_choice_row();
        row.options_en = None;
        let err = row_to_question(&row, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("options_en"));
    }

    #[test]
    fn out_of_range_correct_answer_fails_validation() {
        let mut row = multiple_choice_row();
        row.correct_answer = serde_json::json!(5);
        let err = row_to_question(&row, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("correct_option"));
    }

    #[test]
    fn row_errors_carry_row_numbers_and_do_not_stop_the_batch() {
        // Pure half of the import loop: conversion outcomes per row.
        let mut bad = multiple_choice_row();
        bad.question_en = String::new();
        let rows = vec![multiple_choice_row(), bad, multiple_choice_row()];

        let now = Utc::now();
        let mut imported = 0;
        let mut errors = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            match row_to_question(row, now) {
                Ok(_) => imported += 1,
                Err(err) => errors.push(format!("Row {}: {}", index + 1, err)),
            }
        }
        assert_eq!(imported, 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Row 2:"));
        assert!(errors[0].contains("prompt.en"));
    }

    #[test]
    fn template_lists_both_question_shapes() {
        let template = csv_template();
        let mut lines = template.lines();
        assert!(lines.next().unwrap().starts_with("topic_id,type,"));
        assert!(template.contains("multiple_choice"));
        assert!(template.contains("true_false"));
    }
}
