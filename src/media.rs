use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};

const RECIPE_IMAGE_DIR: &str = "recipes/images";

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("This field may not be blank.")]
    Empty,
    #[error("Upload a valid image. The data is not valid base64.")]
    InvalidBase64(base64::DecodeError),
    #[error("Upload a valid image. Unsupported image format.")]
    UnsupportedFormat,
    #[error("Failed storing media file")]
    Io(std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Decodes `data:image/<ext>;base64,<payload>` or a bare base64 payload.
/// The format always comes from the decoded bytes, the declared mime type is
/// not trusted.
pub fn decode_base64_image(data: &str) -> Result<DecodedImage, MediaError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(MediaError::Empty);
    }

    let payload = match data.split_once(";base64,") {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => data,
    };

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(MediaError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }

    let format = ImageFormat::sniff(&bytes).ok_or(MediaError::UnsupportedFormat)?;

    Ok(DecodedImage { format, bytes })
}

/// Writes a recipe image below `root` and returns its path relative to it.
#[tracing::instrument(name = "store recipe image", skip(root, image), fields(format = ?image.format))]
pub async fn store_recipe_image(root: &Path, image: &DecodedImage) -> Result<String, MediaError> {
    let relative_path = format!(
        "{}/{}.{}",
        RECIPE_IMAGE_DIR,
        uuid::Uuid::new_v4(),
        image.format.extension()
    );

    let directory = root.join(RECIPE_IMAGE_DIR);
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(MediaError::Io)?;
    tokio::fs::write(root.join(&relative_path), &image.bytes)
        .await
        .map_err(MediaError::Io)?;

    Ok(relative_path)
}

/// Best effort: a missing file is not an error.
#[tracing::instrument(name = "remove media file", skip(root))]
pub async fn remove_media_file(root: &Path, relative_path: &str) {
    let path: PathBuf = root.join(relative_path);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            tracing::warn!(err.msg = %error, path = %path.display(), "Failed removing media file");
        }
    }
}
