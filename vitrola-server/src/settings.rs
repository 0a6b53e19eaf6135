use axum::{
    extract::State,
    routing::get,
    Json,
};

use crate::{
    auth::AdminSession,
    context::ServerContext,
    errors::ServerResult,
    schemas::{ConfigSchema, ValidatedJson},
    serialized::{ConfigEntry, Settings, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/config",
    tag = "settings",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Settings)
    )
)]
async fn settings(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> Json<Settings> {
    Json(context.jukebox.config().to_serialized())
}

/// Changes a single setting. Keys the jukebox does not know are passed on to clients as is.
#[utoipa::path(
    post,
    path = "/api/config",
    tag = "settings",
    request_body = ConfigSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ConfigEntry)
    )
)]
async fn update(
    _session: AdminSession,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<ConfigSchema>,
) -> ServerResult<Json<ConfigEntry>> {
    context.jukebox.update_config(&body.key, body.value.clone())?;

    Ok(Json(ConfigEntry {
        key: body.key,
        value: body.value,
    }))
}

pub fn router() -> Router {
    Router::new().route("/", get(settings).post(update))
}
