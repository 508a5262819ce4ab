//! Per-field language resolution.
//!
//! A localized field pair is a base field `F` authored in the canonical
//! language plus an optional override `F_<code>`. Resolution is pure and
//! applied field by field, so an entry may show a translated title next to an
//! untranslated description.

use crate::i18n::{Language, LanguageRegistry};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn variant_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+)_([a-z]{2})$").expect("valid variant regex"))
}

/// Whether a value counts as provided. Null, empty strings and empty arrays do not.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// The key holding `field`'s override for `language`.
pub fn variant_key(field: &str, language: Language) -> String {
    format!("{}_{}", field, language.code())
}

/// Split `title_tr` into `("title", "tr")` when the suffix is a registered
/// non-canonical language. Other underscores (`cv_en`) are left alone.
pub fn split_variant(key: &str) -> Option<(&str, &str)> {
    let captures = variant_pattern().captures(key)?;
    let base = captures.get(1)?.as_str();
    let code = captures.get(2)?.as_str();

    if LanguageRegistry::get().variant_codes().contains(&code) {
        Some((base, code))
    } else {
        None
    }
}

/// Resolve `field` for `language`, falling back to the base value.
pub fn resolve_field<'a>(
    fields: &'a Map<String, Value>,
    field: &str,
    language: Language,
) -> Option<&'a Value> {
    if !language.is_canonical() {
        if let Some(value) = fields.get(&variant_key(field, language)) {
            if is_present(value) {
                return Some(value);
            }
        }
    }
    fields.get(field)
}

/// Text form of [`resolve_field`]; non-string values resolve to `None`.
pub fn resolve_text<'a>(
    fields: &'a Map<String, Value>,
    field: &str,
    language: Language,
) -> Option<&'a str> {
    resolve_field(fields, field, language).and_then(Value::as_str)
}

/// Build the display map of a whole entry for `language`.
///
/// Every base field is replaced by its resolved value and every variant key
/// is dropped. A variant without a base field is surfaced under the base name
/// only for its own language.
pub fn localize(fields: &Map<String, Value>, language: Language) -> Map<String, Value> {
    let mut localized = Map::new();

    for (key, value) in fields {
        match split_variant(key) {
            Some((base, code)) => {
                if code == language.code() && !fields.contains_key(base) && is_present(value) {
                    localized.insert(base.to_string(), value.clone());
                }
            }
            None => {
                let resolved = resolve_field(fields, key, language).unwrap_or(value);
                localized.insert(key.clone(), resolved.clone());
            }
        }
    }

    localized
}
