//! Image and template asset loading.
//!
//! Remote product thumbnails are fail-soft: any problem downloading or staging
//! one is logged and reported as "no image" so a broken link never blocks a
//! document. The template itself is the only asset whose absence is fatal.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::template::TemplateAssets;
use super::GeneratorError;
use crate::config::AppConfig;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Build a `data:` URI from raw bytes.
pub fn to_data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(data))
}

/// Downloads remote images and inlines them as data URIs.
pub struct AssetFetcher<'a> {
    client: &'a reqwest::Client,
    scratch_dir: &'a Path,
}

impl<'a> AssetFetcher<'a> {
    /// `client` is expected to carry the request timeout and user agent.
    pub fn new(client: &'a reqwest::Client, scratch_dir: &'a Path) -> Self {
        Self {
            client,
            scratch_dir,
        }
    }

    /// Fetch `url` and return it as a data URI, or `None` on any failure.
    pub async fn fetch_remote_image(&self, url: &str) -> Option<String> {
        match self.try_fetch(url.trim()).await {
            Ok(data_uri) => Some(data_uri),
            Err(e) => {
                log::warn!("Product image unavailable ({}): {}", url.trim(), e);
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();

        let (file, scratch_path) = tempfile::Builder::new()
            .prefix(&format!("img_{}_", Utc::now().timestamp_millis()))
            .suffix(".jpg")
            .tempfile_in(self.scratch_dir)
            .map_err(|e| format!("Failed to create scratch file: {}", e))?
            .into_parts();

        // `scratch_path` removes the file on drop if we bail out early.
        let mut file = fs::File::from_std(file);
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("Failed to write scratch file: {}", e))?;
        }
        file.flush()
            .await
            .map_err(|e| format!("Failed to write scratch file: {}", e))?;
        drop(file);

        let data = fs::read(&scratch_path)
            .await
            .map_err(|e| format!("Failed to read scratch file: {}", e))?;
        fs::remove_file(&scratch_path)
            .await
            .map_err(|e| format!("Failed to remove scratch file: {}", e))?;

        Ok(to_data_uri(&mime_type, &data))
    }
}

/// Load the template (required) plus stylesheet and logo (optional).
pub async fn load_template_assets(config: &AppConfig) -> Result<TemplateAssets, GeneratorError> {
    let template = fs::read_to_string(config.template_path())
        .await
        .map_err(GeneratorError::TemplateIo)?;

    let stylesheet = match fs::read_to_string(config.style_path()).await {
        Ok(css) => css,
        Err(e) => {
            log::warn!("Stylesheet not loaded ({}): {}", config.style_path().display(), e);
            String::new()
        }
    };

    let logo_data_uri = match fs::read(config.logo_path()).await {
        Ok(bytes) => to_data_uri("image/png", &bytes),
        Err(e) => {
            log::warn!("Logo not loaded ({}): {}", config.logo_path().display(), e);
            String::new()
        }
    };

    Ok(TemplateAssets {
        template,
        stylesheet,
        logo_data_uri,
    })
}

/// Resolve a salesperson portrait reference to a file in `public_dir`.
///
/// Only the basename is used, so references such as `/public/ana.png` or
/// `../../etc/passwd` can never leave the directory.
pub fn portrait_path(public_dir: &Path, reference: &str) -> Option<PathBuf> {
    Path::new(reference.trim())
        .file_name()
        .map(|name| public_dir.join(name))
}

/// Inline the salesperson portrait, or `None` when it cannot be read.
pub async fn load_portrait(public_dir: &Path, reference: &str) -> Option<String> {
    let path = portrait_path(public_dir, reference)?;
    match fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or(mime_guess::mime::IMAGE_PNG);
            Some(to_data_uri(mime.essence_str(), &bytes))
        }
        Err(e) => {
            log::warn!("Salesperson portrait not found ({}): {}", path.display(), e);
            None
        }
    }
}
