//! Internationalization (i18n) for bilingual content.
//!
//! # Architecture
//!
//! - `registry`: single source of truth for supported languages
//! - `language`: validated `Language` type
//! - `resolve`: per-field resolution of `F` / `F_<code>` pairs
//! - `strings`: fixed section and admin labels
//!
//! # Example
//!
//! ```rust,ignore
//! use portfolio_cms::i18n::{resolve_text, Language};
//!
//! let turkish = Language::from_code("tr")?;
//! let title = resolve_text(&entry.fields, "title", turkish);
//! ```

mod language;
mod registry;
mod resolve;
mod strings;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
pub use resolve::{localize, resolve_field, resolve_text, split_variant, variant_key};
pub use strings::LanguageStrings;
