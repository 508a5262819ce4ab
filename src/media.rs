use crate::config::Config;
use crate::error::{CmsError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reference to a stored upload, suitable for an entry's `image` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRef {
    pub url: String,
    pub content_type: String,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

/// Image uploads kept as files under a directory and referenced by URL.
#[derive(Debug, Clone)]
pub struct MediaStore {
    upload_dir: PathBuf,
    url_prefix: String,
    max_bytes: usize,
    max_width: u32,
    quality: u8,
}

impl MediaStore {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        url_prefix: &str,
        max_bytes: usize,
        max_width: u32,
        quality: u8,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            max_bytes,
            max_width: max_width.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.upload_dir,
            &config.upload_url_prefix,
            config.max_upload_bytes,
            config.image_max_width,
            config.image_quality,
        )
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate, shrink and persist an uploaded image.
    pub async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<MediaRef> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !mime.starts_with("image/") {
            return Err(CmsError::UnsupportedMedia(content_type.to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(CmsError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let original_size = bytes.len();
        let (max_width, quality) = (self.max_width, self.quality);
        let compressed =
            tokio::task::spawn_blocking(move || compress_image(&bytes, max_width, quality))
                .await
                .map_err(std::io::Error::other)??;

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let filename = format!("{}.jpg", uuid::Uuid::new_v4().simple());
        tokio::fs::write(self.upload_dir.join(&filename), &compressed.bytes).await?;

        info!(
            "Stored upload {} ({} -> {} bytes, {}x{})",
            filename,
            original_size,
            compressed.bytes.len(),
            compressed.width,
            compressed.height
        );

        Ok(MediaRef {
            url: format!("{}/{}", self.url_prefix, filename),
            content_type: "image/jpeg".to_string(),
            size: compressed.bytes.len(),
            width: compressed.width,
            height: compressed.height,
        })
    }
}

pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Downscale to at most `max_width` (aspect ratio kept) and re-encode as JPEG.
pub fn compress_image(bytes: &[u8], max_width: u32, quality: u8) -> Result<CompressedImage> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let img = if width > max_width {
        let scaled_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
        img.resize_exact(max_width, scaled_height, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut encoded = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality))?;

    Ok(CompressedImage {
        bytes: encoded,
        width: rgb.width(),
        height: rgb.height(),
    })
}
