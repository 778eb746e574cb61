use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::files::FileInfoResponse;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use cubby_core::AppError;
use cubby_services::IncomingUpload;
use cubby_storage::ByteSource;
use std::sync::Arc;
use uuid::Uuid;

/// Upload a file as `multipart/form-data`.
///
/// An optional `folder` text field (UUID) may precede the `file` field. The
/// file body is forwarded to the pipeline as it arrives; it is never buffered
/// whole.
#[utoipa::path(
    post,
    path = "/api/v0/files",
    tag = "files",
    responses(
        (status = 201, description = "File stored", body = FileInfoResponse),
        (status = 400, description = "Malformed multipart body", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    UserContext(identity): UserContext,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut folder_id: Option<Uuid> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(String::from);
        match field_name.as_deref() {
            Some("folder") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Unreadable folder field: {}", e))
                })?;
                folder_id = Some(Uuid::parse_str(text.trim()).map_err(AppError::from)?);
            }
            Some("file") => {
                let upload = IncomingUpload {
                    filename: field.file_name().unwrap_or("file").to_string(),
                    declared_content_type: field.content_type().map(String::from),
                    folder_id,
                };

                // Bridge the borrowed multipart field into the 'static byte
                // source the pipeline consumes, chunk by chunk.
                let (tx, rx) = tokio::sync::mpsc::channel::<std::io::Result<Bytes>>(8);
                let source: ByteSource = Box::pin(futures::stream::unfold(
                    rx,
                    |mut rx| async move { rx.recv().await.map(|item| (item, rx)) },
                ));

                let ingest = state.pipeline.ingest(&identity, upload, source);
                let feed = async move {
                    loop {
                        match field.chunk().await {
                            Ok(Some(bytes)) => {
                                if tx.send(Ok(bytes)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                let _ = tx
                                    .send(Err(std::io::Error::other(e.to_string())))
                                    .await;
                                break;
                            }
                        }
                    }
                };

                let (record, ()) = tokio::join!(ingest, feed);
                let record = record?;

                return Ok((StatusCode::CREATED, Json(FileInfoResponse::from(&record))));
            }
            _ => {}
        }
    }

    Err(AppError::InvalidInput("Multipart body contains no file field".to_string()).into())
}
