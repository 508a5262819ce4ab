//! Language type: validated language representation.

use crate::error::CmsError;
use crate::i18n::{LanguageConfig, LanguageRegistry};

/// A language that has been validated against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "tr")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    pub const TURKISH: Language = Language { code: "tr" };

    /// Create a Language from a language code string.
    ///
    /// Codes are matched case-insensitively; unknown or disabled languages are
    /// rejected with `CmsError::UnsupportedLanguage`.
    pub fn from_code(code: &str) -> Result<Language, CmsError> {
        let normalized = code.trim().to_ascii_lowercase();

        let registry = LanguageRegistry::get();
        if !registry.is_enabled(&normalized) {
            return Err(CmsError::UnsupportedLanguage(code.to_string()));
        }

        registry
            .get_by_code(&normalized)
            .map(|config| Language { code: config.code })
            .ok_or_else(|| CmsError::UnsupportedLanguage(code.to_string()))
    }

    /// Resolve an optional `?lang=` value, defaulting to the canonical language.
    pub fn from_query(code: Option<&str>) -> Result<Language, CmsError> {
        match code {
            Some(code) if !code.trim().is_empty() => Self::from_code(code),
            _ => Ok(Self::canonical()),
        }
    }

    /// The language base fields are authored in.
    pub fn canonical() -> Language {
        let config = LanguageRegistry::get().canonical();
        Language { code: config.code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a Language built through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn is_canonical(&self) -> bool {
        self.config().is_canonical
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::canonical()
    }
}
