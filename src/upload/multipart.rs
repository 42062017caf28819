//! Multipart form reading

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

use super::{UploadError, UploadedFile};

/// Form field carrying the uploaded volumes
pub const FILES_FIELD: &str = "files";

/// Collect the `files` fields of a multipart body.
/// Reading stops as soon as a third file shows up.
pub async fn read_files(
    mut multipart: Multipart,
) -> std::result::Result<Vec<UploadedFile>, UploadError> {
    let mut files = Vec::with_capacity(2);

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        if files.len() == 2 {
            return Err(UploadError::WrongCount(files.len() + 1));
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(upload_error)?;

        files.push(UploadedFile { filename, content });
    }

    Ok(files)
}

/// Body-limit overruns keep their 413 meaning
fn upload_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge(err.body_text())
    } else {
        UploadError::Multipart(err.body_text())
    }
}
