use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "es" => Some(Locale::Es),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Es
    }
}

/// Text that must exist in both platform languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub es: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(es: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            es: es.into(),
            en: en.into(),
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Es => &self.es,
            Locale::En => &self.en,
        }
    }

    /// Returns the locale missing from this text, if any.
    pub fn missing_locale(&self) -> Option<Locale> {
        if self.es.trim().is_empty() {
            Some(Locale::Es)
        } else if self.en.trim().is_empty() {
            Some(Locale::En)
        } else {
            None
        }
    }
}
