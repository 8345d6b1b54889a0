//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use boom_core::models;

/// Registers the `bearer_auth` scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Boom API",
        version = "0.1.0",
        description = "Video upload service. A video and its thumbnail are staged, stored in a durable object store and committed as one record; failed uploads are compensated so no orphaned objects remain."
    ),
    paths(
        handlers::video_upload::upload_video,
        handlers::video_get::list_videos,
        handlers::video_get::get_video,
        handlers::video_update::update_video,
        handlers::video_update::delete_video,
        handlers::video_engagement::like_video,
        handlers::video_engagement::view_video,
        handlers::video_engagement::add_comment,
    ),
    components(
        schemas(
            models::MediaRecord,
            models::Comment,
            models::RemoteAsset,
            models::AssetKind,
            models::MediaRecordUpdate,
            models::NewCommentRequest,
            models::LikeResponse,
            models::ViewResponse,
            handlers::video_get::ListQuery,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "videos", description = "Video upload, listing, editing and engagement")
    )
)]
pub struct ApiDoc;

pub fn openapi_document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
