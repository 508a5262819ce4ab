//! Record kinds stored in the ordered collections.
//!
//! Documents are open JSON maps; these typed shapes are what admin input is
//! checked against before it reaches the store. Extra fields are allowed and
//! kept as-is.

use crate::error::CmsError;
use crate::i18n::{Language, LanguageStrings};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field every entry must carry, in the canonical language.
pub const PRIMARY_FIELD: &str = "title";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Projects,
    Blogs,
    Certificates,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Projects,
        CollectionKind::Blogs,
        CollectionKind::Certificates,
    ];

    /// Collection name in the document store.
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Projects => "projects",
            CollectionKind::Blogs => "blogs",
            CollectionKind::Certificates => "certificates",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CmsError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| CmsError::UnknownCollection(name.to_string()))
    }

    /// Check `fields` against this kind's shape.
    pub fn validate(&self, fields: &Map<String, Value>) -> Result<(), CmsError> {
        match self {
            CollectionKind::Projects => check_shape::<Project>(*self, fields),
            CollectionKind::Blogs => check_shape::<BlogPost>(*self, fields),
            CollectionKind::Certificates => check_shape::<Certificate>(*self, fields),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_shape<T: DeserializeOwned>(
    kind: CollectionKind,
    fields: &Map<String, Value>,
) -> Result<(), CmsError> {
    serde_json::from_value::<T>(Value::Object(fields.clone()))
        .map(|_| ())
        .map_err(|e| CmsError::Validation(format!("invalid {} entry: {}", kind, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectCategory {
    #[serde(rename = "Mobile App")]
    MobileApp,
    #[default]
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Tools")]
    Tools,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 3] = [
        ProjectCategory::MobileApp,
        ProjectCategory::WebDevelopment,
        ProjectCategory::Tools,
    ];

    /// Value stored in the `category` field.
    pub fn name(&self) -> &'static str {
        match self {
            ProjectCategory::MobileApp => "Mobile App",
            ProjectCategory::WebDevelopment => "Web Development",
            ProjectCategory::Tools => "Tools",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.name() == name)
    }

    /// Display label for `language`.
    pub fn label(&self, language: Language) -> &'static str {
        let strings = LanguageStrings::for_language(language);
        match self {
            ProjectCategory::MobileApp => strings.projects_mobile_app,
            ProjectCategory::WebDevelopment => strings.projects_web_development,
            ProjectCategory::Tools => strings.projects_tools,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub title_tr: Option<String>,
    pub category: ProjectCategory,
    pub image: String,
    pub gallery: Vec<String>,
    pub description: String,
    pub description_tr: Option<String>,
    #[serde(rename = "githubUrl")]
    pub github_url: Option<String>,
    #[serde(rename = "demoUrl")]
    pub demo_url: Option<String>,
    pub technologies: Vec<String>,
    pub featured: Option<bool>,
    pub order: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    pub title: String,
    pub title_tr: Option<String>,
    pub excerpt: String,
    pub excerpt_tr: Option<String>,
    pub content: String,
    pub content_tr: Option<String>,
    pub image: String,
    pub date: String,
    pub category: String,
    pub category_tr: Option<String>,
    #[serde(rename = "readTime")]
    pub read_time: Option<String>,
    #[serde(rename = "readTime_tr")]
    pub read_time_tr: Option<String>,
    pub order: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub title: String,
    pub title_tr: Option<String>,
    pub issuer: String,
    pub issuer_tr: Option<String>,
    pub date: String,
    pub date_tr: Option<String>,
    pub image: String,
    #[serde(rename = "credentialUrl")]
    pub credential_url: Option<String>,
    pub gallery: Vec<String>,
    pub order: Option<f64>,
}
