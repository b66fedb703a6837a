use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::usuario::list_usuarios,
            handlers::usuario::create_usuario
        ))
        .routes(routes!(
            handlers::usuario::get_usuario,
            handlers::usuario::update_usuario,
            handlers::usuario::delete_usuario
        ))
        .routes(routes!(handlers::usuario::list_usuarios_by_theme));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::usuario::upload_image))
        .layer(handlers::usuario::upload_body_limit(
            config.storage.max_asset_size,
        ));

    crud.merge(upload)
}

/// Routes mounted under `/resources`.
pub fn resource_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::image::download_image))
}
