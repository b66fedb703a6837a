use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::AssetName;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::AppPath;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/images/{name}",
    tag = "Images",
    operation_id = "downloadImage",
    summary = "Download a stored image",
    params(("name" = String, Path, description = "Image file name, as found in `imagemURL`")),
    responses(
        (status = 200, description = "Image content, typed by file extension"),
        (status = 404, description = "No such image (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_image(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Response, AppError> {
    let name = AssetName::parse(&name)?;
    let reader = state.service.assets().get_stream(&name).await?;

    let mime = mime_guess::from_path(name.as_str()).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(AppError::context("Failed to read image"))
}
