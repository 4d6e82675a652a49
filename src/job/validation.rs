use crate::job::error::JobError;
use crate::job::types::SelectedFile;
use std::fs;
use std::path::Path;

pub const ALLOWED_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

pub const ALLOWED_MIME_TYPES: [&str; 8] = [
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/x-flv",
    "video/webm",
];

pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// A file passes if either its MIME type or its extension is allowed.
pub fn is_supported_video(file: &SelectedFile) -> bool {
    let mime_ok = file
        .mime
        .as_deref()
        .map(|mime| ALLOWED_MIME_TYPES.contains(&mime.to_lowercase().as_str()))
        .unwrap_or(false);

    let ext_ok = file
        .extension()
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);

    mime_ok || ext_ok
}

pub fn validate(file: &SelectedFile, max_bytes: u64) -> Result<(), JobError> {
    if !is_supported_video(file) {
        return Err(JobError::InvalidFormat {
            name: file.name.clone(),
        });
    }

    if file.size > max_bytes {
        return Err(JobError::FileTooLarge {
            size: file.size,
            max: max_bytes,
        });
    }

    Ok(())
}

/// Build a [`SelectedFile`] from disk metadata, guessing the MIME type from the extension.
pub fn inspect_path(path: &Path) -> Result<SelectedFile, JobError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| JobError::Io(format!("Invalid filename: {}", path.display())))?
        .to_string();

    let metadata = fs::metadata(path).map_err(|e| JobError::Io(e.to_string()))?;
    if !metadata.is_file() {
        return Err(JobError::Io(format!("{} is not a file", path.display())));
    }

    let mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());

    Ok(SelectedFile {
        name,
        path: path.to_path_buf(),
        size: metadata.len(),
        mime,
    })
}
