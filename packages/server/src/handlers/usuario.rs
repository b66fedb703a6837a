use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::{AppJson, AppPath};
use crate::handlers::{json_or_no_content, list_or_no_content};
use crate::models::usuario::{DeletedResponse, UsuarioDetail, UsuarioPayload};
use crate::service::ImageUpload;
use crate::state::AppState;

const RETRIEVE_FAILED: &str = "Failed to retrieve usuarios";
const ADD_FAILED: &str = "Failed to add usuario";
const UPDATE_FAILED: &str = "Failed to update usuario";
const DELETE_FAILED: &str = "Failed to delete usuario";
const UPLOAD_FAILED: &str = "Failed to upload usuario image";

/// Multipart framing allowance on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Body limit layer for the image upload route.
pub fn upload_body_limit(max_asset_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_asset_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    get,
    path = "/usuarios",
    tag = "Usuarios",
    operation_id = "listUsuarios",
    summary = "List usuarios",
    description = "Returns every usuario with its social links. Responds `204` when there are none.",
    responses(
        (status = 200, description = "Usuarios", body = Vec<UsuarioDetail>),
        (status = 204, description = "No usuarios"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_usuarios(State(state): State<AppState>) -> Result<Response, AppError> {
    let usuarios = state
        .service
        .list_all()
        .await
        .map_err(AppError::context(RETRIEVE_FAILED))?;

    Ok(list_or_no_content(usuarios))
}

#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    operation_id = "getUsuario",
    summary = "Get a usuario by ID",
    params(("id" = i32, Path, description = "Usuario ID")),
    responses(
        (status = 200, description = "Usuario", body = UsuarioDetail),
        (status = 204, description = "No usuario with this ID"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_usuario(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Response, AppError> {
    let usuario = state
        .service
        .get_by_id(id)
        .await
        .map_err(AppError::context(RETRIEVE_FAILED))?;

    Ok(json_or_no_content(usuario))
}

#[utoipa::path(
    get,
    path = "/usuarios/{id}/tema",
    tag = "Usuarios",
    operation_id = "listUsuariosByTheme",
    summary = "List usuarios with a theme",
    description = "Exact match on `tema`. Responds `204` when nothing matches.",
    params(("id" = String, Path, description = "Theme to match")),
    responses(
        (status = 200, description = "Matching usuarios", body = Vec<UsuarioDetail>),
        (status = 204, description = "No usuario has this theme"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_usuarios_by_theme(
    State(state): State<AppState>,
    AppPath(theme): AppPath<String>,
) -> Result<Response, AppError> {
    let usuarios = state
        .service
        .list_by_theme(&theme)
        .await
        .map_err(AppError::context(RETRIEVE_FAILED))?;

    Ok(list_or_no_content(usuarios))
}

#[utoipa::path(
    post,
    path = "/usuarios",
    tag = "Usuarios",
    operation_id = "createUsuario",
    summary = "Create a usuario",
    request_body = UsuarioPayload,
    responses(
        (status = 200, description = "Created usuario", body = UsuarioDetail),
        (status = 204, description = "Nothing was created"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_usuario(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UsuarioPayload>,
) -> Result<Response, AppError> {
    let usuario = state
        .service
        .create(payload)
        .await
        .map_err(AppError::context(ADD_FAILED))?;

    if let Some(usuario) = &usuario {
        info!(usuario_id = usuario.id, "Usuario created");
    }
    Ok(json_or_no_content(usuario))
}

#[utoipa::path(
    put,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    operation_id = "updateUsuario",
    summary = "Replace a usuario",
    description = "Full replacement, social links included. `imagemURL` in the body is \
        ignored and the stored image reference is kept.",
    params(("id" = i32, Path, description = "Usuario ID")),
    request_body = UsuarioPayload,
    responses(
        (status = 200, description = "Updated usuario", body = UsuarioDetail),
        (status = 204, description = "No usuario with this ID"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_usuario(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UsuarioPayload>,
) -> Result<Response, AppError> {
    let usuario = state
        .service
        .update(id, payload)
        .await
        .map_err(AppError::context(UPDATE_FAILED))?;

    Ok(json_or_no_content(usuario))
}

#[utoipa::path(
    delete,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    operation_id = "deleteUsuario",
    summary = "Delete a usuario and its image",
    params(("id" = i32, Path, description = "Usuario ID")),
    responses(
        (status = 200, description = "Deleted", body = DeletedResponse),
        (status = 204, description = "No usuario with this ID"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_usuario(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Response, AppError> {
    let deleted = state
        .service
        .delete(id)
        .await
        .map_err(AppError::context(DELETE_FAILED))?;

    Ok(json_or_no_content(deleted.map(|_| DeletedResponse::new())))
}

#[utoipa::path(
    post,
    path = "/usuarios/upload-image/{usuarioId}",
    tag = "Usuarios",
    operation_id = "uploadUsuarioImage",
    summary = "Upload a usuario's image",
    description = "Uses the first multipart field that carries a filename. The previous image \
        is removed once the new one is stored. An empty file keeps the current image.",
    params(("usuarioId" = i32, Path, description = "Usuario ID")),
    request_body(content_type = "multipart/form-data", description = "Image file"),
    responses(
        (status = 200, description = "Updated usuario", body = UsuarioDetail),
        (status = 204, description = "No usuario with this ID"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AppPath(usuario_id): AppPath<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let existing = state
        .service
        .get_by_id(usuario_id)
        .await
        .map_err(AppError::context(UPLOAD_FAILED))?;
    if existing.is_none() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let mut multipart = multipart.map_err(|e| AppError::internal(UPLOAD_FAILED, e.body_text()))?;
    let upload = read_first_file(&mut multipart).await?;

    let usuario = state
        .service
        .upload_image(usuario_id, upload)
        .await
        .map_err(AppError::context(UPLOAD_FAILED))?;

    Ok(json_or_no_content(usuario))
}

async fn read_first_file(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::context(UPLOAD_FAILED))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let data = field.bytes().await.map_err(AppError::context(UPLOAD_FAILED))?;
        return Ok(ImageUpload {
            file_name,
            data: data.to_vec(),
        });
    }

    Err(AppError::internal(UPLOAD_FAILED, "No file was uploaded"))
}
