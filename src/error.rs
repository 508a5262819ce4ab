use thiserror::Error;

/// Failures raised by a `DocumentStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the content service.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("{0}")]
    Validation(String),

    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("invalid or missing admin credentials")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// First write of a reorder landed, the second did not.
    #[error("reorder left {collection} partially swapped ({moved} moved, {displaced} not updated): {source}")]
    PartialReorder {
        collection: String,
        moved: String,
        displaced: String,
        #[source]
        source: StoreError,
    },

    #[error("unsupported media type '{0}'")]
    UnsupportedMedia(String),

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("image could not be processed: {0}")]
    Image(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CmsError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        CmsError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;
