use std::path::Path as FilePath;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tokio::io::AsyncWriteExt;
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::handlers::current_user;
use crate::models::{PrintType, StatusForm};
use crate::state::AppState;

/// GET /api/jobs. Scoped by role: staff get the full triage-ordered queue,
/// students their own jobs.
pub async fn list_jobs(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let requester = current_user(&session).await?;
    let records = state.jobs.list_jobs(&requester).await?;
    Ok(Json(records).into_response())
}

// Holds the pieces of the multipart form as fields stream in.
struct UploadForm {
    file: Option<(String, String)>,
    copies: Option<u32>,
    print_type: Option<PrintType>,
}

/// POST /api/jobs. Multipart upload with `file`, `copies`, `printType`.
pub async fn create_job(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let requester = current_user(&session).await?;
    tracing::debug!("Processing job upload for user: {}", requester.username);

    let mut form = UploadForm {
        file: None,
        copies: None,
        print_type: None,
    };

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation(format!("Failed to process form field: {}", e))
    })? {
        match field.name().unwrap_or("") {
            "file" => {
                form.file = Some(save_upload(&mut field, &state.config.upload.dir).await?);
            }
            "copies" => {
                let value = read_text_field(field).await?;
                form.copies = Some(
                    value
                        .parse()
                        .map_err(|_| AppError::Validation(format!("Invalid copies value '{}'", value)))?,
                );
            }
            "printType" => {
                let value = read_text_field(field).await?;
                form.print_type = Some(
                    PrintType::parse(&value)
                        .ok_or_else(|| AppError::Validation(format!("Invalid print type '{}'", value)))?,
                );
            }
            name => {
                tracing::warn!("Unexpected form field: {}", name);
            }
        }
    }

    let (file_handle, file_name) = form
        .file
        .ok_or_else(|| AppError::Validation("No file uploaded".into()))?;
    let copies = form
        .copies
        .ok_or_else(|| AppError::Validation("Missing copies field".into()))?;
    let print_type = form
        .print_type
        .ok_or_else(|| AppError::Validation("Missing printType field".into()))?;

    let job = state
        .jobs
        .submit_job(&requester, file_name, file_handle, copies, print_type)
        .await?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

/// GET /api/jobs/:id.
pub async fn job_detail(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let requester = current_user(&session).await?;
    let job = state.jobs.job_detail(&requester, &id).await?;
    Ok(Json(job).into_response())
}

/// PATCH /api/jobs/:id/status. Staff only.
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(form): Json<StatusForm>,
) -> AppResult<Response> {
    let requester = current_user(&session).await?;
    let job = state.jobs.set_status(&requester, &id, &form.status).await?;
    Ok(Json(job).into_response())
}

// Streams an uploaded file into the upload directory under a generated
// opaque name, keeping only the original extension. Returns (handle,
// original filename).
async fn save_upload(field: &mut Field<'_>, dir: &str) -> AppResult<(String, String)> {
    let original = field
        .file_name()
        .ok_or_else(|| AppError::Validation("Missing filename in upload".into()))?
        .to_string();

    let extension = FilePath::new(&original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let handle = format!("{}{}", uuid::Uuid::new_v4(), extension);
    let path = FilePath::new(dir).join(&handle);

    let mut file = tokio::fs::File::create(&path).await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::debug!("Saved upload {} as {}", original, handle);
    Ok((handle, original))
}

async fn read_text_field(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read field: {}", e)))
}
