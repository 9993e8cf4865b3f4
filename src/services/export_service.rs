use crate::error::Result;
use crate::models::question::{Question, QuestionKind};
use crate::models::topic;
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook from the question bank.
    pub fn generate_question_bank_xlsx(questions: &[Question]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Questions")?;

        let header_bg = Color::RGB(0x14532D); // Green 900
        let header_text = Color::White;
        let alt_row = Color::RGB(0xF0FDF4); // Green 50
        let border_color = Color::RGB(0xD1D5DB); // Gray 300

        let columns = [
            ("№", 6.0),
            ("Topic", 28.0),
            ("Type", 16.0),
            ("Question (ES)", 50.0),
            ("Question (EN)", 50.0),
            ("Options (EN)", 45.0),
            ("Correct", 10.0),
            ("Difficulty", 12.0),
            ("Created", 20.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(14)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 32)?;
        let exported = chrono::Utc::now().format("%d.%m.%Y %H:%M UTC").to_string();
        worksheet.merge_range(
            0,
            0,
            0,
            (columns.len() - 1) as u16,
            &format!("Question bank — {} questions, exported {}", questions.len(), exported),
            &title_format,
        )?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_with_format(1, i as u16, *name, &header_format)?;
        }

        let base_format = Format::new()
            .set_font_size(10)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let alt_format = base_format.clone().set_background_color(alt_row);

        for (i, question) in questions.iter().enumerate() {
            let row = (i + 2) as u32;
            let format = if i % 2 == 0 { &base_format } else { &alt_format };

            let topic_name = topic::get(question.topic_id)
                .map(|t| t.name.en.clone())
                .unwrap_or_else(|| format!("Topic {}", question.topic_id));
            let (options, correct) = match &question.kind {
                QuestionKind::MultipleChoice {
                    options,
                    correct_option,
                } => (options.en.join(" | "), correct_option.to_string()),
                QuestionKind::TrueFalse { answer } => (
                    "True | False".to_string(),
                    if *answer { "True" } else { "False" }.to_string(),
                ),
            };

            worksheet.write_with_format(row, 0, (i + 1) as u32, format)?;
            worksheet.write_with_format(row, 1, &topic_name, format)?;
            worksheet.write_with_format(row, 2, question.kind.type_str(), format)?;
            worksheet.write_with_format(row, 3, &question.prompt.es, format)?;
            worksheet.write_with_format(row, 4, &question.prompt.en, format)?;
            worksheet.write_with_format(row, 5, &options, format)?;
            worksheet.write_with_format(row, 6, &correct, format)?;
            worksheet.write_with_format(row, 7, question.difficulty.as_str(), format)?;
            worksheet.write_with_format(
                row,
                8,
                &question.created_at.format("%Y-%m-%d %H:%M").to_string(),
                format,
            )?;
        }

        let bytes = workbook.save_to_buffer()?;
        Ok(bytes)
    }
}
