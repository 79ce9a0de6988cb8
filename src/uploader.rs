use std::path::Path;

use actix_multipart::form::tempfile::TempFile;

pub const UPLOAD_DIR: &str = "static/uploads";

#[derive(Debug)]
pub enum UploadError {
    NotAnImage,
    Other(anyhow::Error),
}

impl<E: Into<anyhow::Error>> From<E> for UploadError {
    fn from(err: E) -> Self {
        Self::Other(err.into())
    }
}

/// Strips any client-supplied path and anything that is not safe to put in
/// a filesystem name. Browsers on some platforms send full paths.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Persists an uploaded image under `dir` as `{prefix}{sanitized name}` and
/// returns the stored filename. `Ok(None)` means the form slot was left
/// empty. Re-uploading under the same name silently overwrites, which is
/// how image replacement works.
pub fn store_upload(
    file: &TempFile,
    prefix: &str,
    dir: &str,
) -> Result<Option<String>, UploadError> {
    let name = match file.file_name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(None),
    };
    if file.size == 0 {
        return Ok(None);
    }
    match &file.content_type {
        Some(mime) if mime.type_() == mime::IMAGE => {}
        _ => return Err(UploadError::NotAnImage),
    }

    let stored = format!("{prefix}{}", sanitize_filename(name));
    std::fs::create_dir_all(dir)?;
    std::fs::copy(file.file.path(), Path::new(dir).join(&stored))?;
    Ok(Some(stored))
}

/// Resolves what an image field ends up holding after an admin edit:
/// an explicit delete beats a fresh upload, a fresh upload beats the
/// value already stored.
pub fn resolve_image(previous: &str, delete: bool, stored: Option<String>) -> String {
    if delete {
        return String::new();
    }
    match stored {
        Some(name) => name,
        None => previous.to_string(),
    }
}
