use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageUpdateRequest {
    pub language: String,
}
