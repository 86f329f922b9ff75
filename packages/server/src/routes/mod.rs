use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::template::list_templates))
        .routes(routes!(handlers::template::get_template))
        .routes(routes!(handlers::template::create_template))
        .routes(routes!(handlers::template::delete_template));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .routes(routes!(handlers::template::update_template))
        .layer(handlers::image::image_upload_body_limit(
            config.upload_body_limit(),
        ));

    crud.merge(upload)
}
