use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use vitrola_core::{Jukebox, PlayerError};

use crate::{
    auth::AdminSession,
    context::ServerContext,
    errors::ServerResult,
    schemas::{TrackSchema, ValidatedJson, VolumeSchema},
    serialized::{PlayerState, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/player/estado",
    tag = "player",
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn state(State(context): State<ServerContext>) -> Json<PlayerState> {
    Json(context.jukebox.player_state().to_serialized())
}

#[utoipa::path(
    post,
    path = "/api/player/play",
    tag = "player",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn play(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, Jukebox::play)
}

#[utoipa::path(
    post,
    path = "/api/player/pause",
    tag = "player",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn pause(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, Jukebox::pause)
}

#[utoipa::path(
    post,
    path = "/api/player/resume",
    tag = "player",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn resume(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, Jukebox::resume)
}

#[utoipa::path(
    post,
    path = "/api/player/skip",
    tag = "player",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn skip(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, Jukebox::skip)
}

#[utoipa::path(
    post,
    path = "/api/player/stop",
    tag = "player",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn stop(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, Jukebox::stop)
}

#[utoipa::path(
    post,
    path = "/api/player/volume",
    tag = "player",
    request_body = VolumeSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn volume(
    _session: AdminSession,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<VolumeSchema>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, |jukebox| jukebox.set_volume(body.volume))
}

/// Plays an ambient track right away, only allowed while no request is waiting or playing
#[utoipa::path(
    post,
    path = "/api/player/ambiente",
    tag = "player",
    request_body = TrackSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = PlayerState)
    )
)]
async fn ambient(
    _session: AdminSession,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<TrackSchema>,
) -> ServerResult<Json<PlayerState>> {
    command(&context.jukebox, |jukebox| {
        jukebox.direct_play(body.into()).map(|_| ())
    })
}

/// Runs a player command, responding with the state it left the player in
fn command<F>(jukebox: &Jukebox, f: F) -> ServerResult<Json<PlayerState>>
where
    F: FnOnce(&Jukebox) -> Result<(), PlayerError>,
{
    f(jukebox)?;

    Ok(Json(jukebox.player_state().to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/estado", get(state))
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/skip", post(skip))
        .route("/stop", post(stop))
        .route("/volume", post(volume))
        .route("/ambiente", post(ambient))
}
