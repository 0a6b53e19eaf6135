use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipauto::utoipauto;

#[utoipauto(paths = "./vitrola-server/src")]
#[derive(OpenApi)]
#[openapi(
    modifiers(&Security),
    info(title = "vitrola", description = "The queue, the player and the settings of a jukebox"),
    tags(
        (name = "requests", description = "Song requests and their admission"),
        (name = "player", description = "What is playing, controlled by the admin"),
        (name = "settings", description = "Runtime configuration")
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // The admin token, as configured or printed on startup
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            )
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
