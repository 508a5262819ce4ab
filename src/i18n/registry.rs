//! Language registry: Single source of truth for all supported languages.
//!
//! Content is authored in the canonical language and optionally overridden per
//! field for the others (`title` / `title_tr`). The registry is immutable and
//! initialized once with `OnceLock`.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "tr"); also the suffix of localized fields
    pub code: &'static str,

    /// English name of the language
    pub name: &'static str,

    /// Native name of the language (e.g., "Türkçe")
    pub native_name: &'static str,

    /// Whether base fields are written in this language (only one should be true)
    pub is_canonical: bool,

    /// Whether this language is offered to readers
    pub enabled: bool,
}

pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Codes of every non-canonical language, i.e. every valid field suffix.
    pub fn variant_codes(&self) -> Vec<&'static str> {
        self.languages
            .iter()
            .filter(|lang| !lang.is_canonical)
            .map(|lang| lang.code)
            .collect()
    }

    /// Get the canonical language configuration.
    ///
    /// # Panics
    /// Panics if the registry defines zero or several canonical languages.
    pub fn canonical(&self) -> &LanguageConfig {
        let canonical_langs: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_canonical)
            .collect();

        match canonical_langs.len() {
            0 => panic!("No canonical language found in registry"),
            1 => canonical_langs[0],
            _ => panic!("Multiple canonical languages found in registry"),
        }
    }

    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

/// English is canonical; Turkish overrides are stored as `<field>_tr`.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_canonical: true,
            enabled: true,
        },
        LanguageConfig {
            code: "tr",
            name: "Turkish",
            native_name: "Türkçe",
            is_canonical: false,
            enabled: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();

        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_turkish() {
        let config = LanguageRegistry::get()
            .get_by_code("tr")
            .expect("Turkish should be registered");

        assert_eq!(config.name, "Turkish");
        assert_eq!(config.native_name, "Türkçe");
        assert!(!config.is_canonical);
        assert!(config.enabled);
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        assert!(LanguageRegistry::get().get_by_code("es").is_none());
    }

    #[test]
    fn test_list_enabled_contains_english_and_turkish() {
        let enabled = LanguageRegistry::get().list_enabled();

        assert_eq!(enabled.len(), 2);
        assert!(enabled.iter().any(|lang| lang.code == "en"));
        assert!(enabled.iter().any(|lang| lang.code == "tr"));
    }

    #[test]
    fn test_canonical_returns_english() {
        let canonical = LanguageRegistry::get().canonical();
        assert_eq!(canonical.code, "en");
    }

    #[test]
    fn test_variant_codes_exclude_canonical() {
        assert_eq!(LanguageRegistry::get().variant_codes(), vec!["tr"]);
    }

    #[test]
    fn test_is_enabled() {
        let registry = LanguageRegistry::get();
        assert!(registry.is_enabled("en"));
        assert!(registry.is_enabled("tr"));
        assert!(!registry.is_enabled("fr"));
    }
}
