//! Attachment storage: uploaded OP photos are written to the upload directory
//! and served publicly under `/uploads`.

use std::path::Path;

use rand::Rng;

use crate::errors::AppError;

pub const PUBLIC_PREFIX: &str = "/uploads";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Reduce a client-supplied file name to `[a-z0-9_-]` plus a whitelisted
/// image extension.
pub fn sanitize_filename(original: &str) -> Result<String, AppError> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let (stem, ext) = base
        .rsplit_once('.')
        .ok_or_else(|| AppError::Validation("File must have an image extension".into()))?;
    let ext = ext.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation(format!("Unsupported file type '.{ext}'")));
    }
    let stem: String = stem
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(60)
        .collect();
    let stem = if stem.trim_matches('_').is_empty() { "foto".to_string() } else { stem };
    Ok(format!("{stem}.{ext}"))
}

/// Write `bytes` under `dir` with a random prefix and return its public URL.
pub async fn save_upload(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation("Uploaded file exceeds 10 MiB".into()));
    }
    let clean = sanitize_filename(original_name)?;
    let prefix: [u8; 8] = rand::rng().random();
    let stored = format!("{}-{}", hex::encode(prefix), clean);

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&stored), bytes).await?;
    log::info!("Stored upload {} ({} bytes)", stored, bytes.len());

    Ok(format!("{PUBLIC_PREFIX}/{stored}"))
}
