//! The socket every client keeps open to follow the jukebox

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use vitrola_core::{ClientMessage, ClientRole, ClientSync, ServerMessage};

use crate::{connections::ConnectionHandle, context::ServerContext, Router};

#[derive(Debug, Deserialize)]
struct GatewayQuery {
    #[serde(rename = "papel")]
    role: Option<ClientRole>,
}

async fn gateway(
    ws: WebSocketUpgrade,
    Query(query): Query<GatewayQuery>,
    State(context): State<ServerContext>,
) -> Response {
    let role = query.role.unwrap_or(ClientRole::Customer);

    ws.on_upgrade(move |socket| handle_socket(socket, role, context))
}

async fn handle_socket(socket: WebSocket, role: ClientRole, context: ServerContext) {
    let (mut outgoing, mut incoming) = socket.split();
    let (handle, mut outbox) = context.connections.connect(role);

    info!(
        "Connection {} opened as {:?}, {} connected",
        handle.id,
        role,
        context.connections.count()
    );

    let writer = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if outgoing.send(Message::Text(text.to_string())).await.is_err() {
                break;
            }
        }
    });

    let mut sync = ClientSync::default();

    while let Some(message) = incoming.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!("Connection {} errored: {}", handle.id, err);
                break;
            }
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(message) => handle_message(&context, &handle, &mut sync, message),
            Err(err) => warn!("Connection {} sent an invalid message: {}", handle.id, err),
        }
    }

    writer.abort();
    info!("Connection {} closed", handle.id);
}

fn handle_message(
    context: &ServerContext,
    handle: &ConnectionHandle,
    sync: &mut ClientSync,
    message: ClientMessage,
) {
    if message.is_display_only() && handle.role != ClientRole::Display {
        warn!(
            "Connection {} is not a display, ignored {:?}",
            handle.id, message
        );
        return;
    }

    let jukebox = &context.jukebox;
    let deliver = |snapshot| {
        context
            .connections
            .send_to(handle.id, &ServerMessage::InitialState(snapshot))
    };

    match message {
        ClientMessage::RequestInitialState { revision } => {
            jukebox.resync(sync, revision, deliver);
        }
        ClientMessage::Acknowledge { revision } => {
            jukebox.acknowledge(sync, revision, deliver);
        }
        ClientMessage::TrackEnded { id } => {
            if !jukebox.track_ended(id) {
                debug!("Ignored end of {}, it is not current", id);
            }
        }
        ClientMessage::PlaybackError { id, message } => {
            jukebox.playback_error(id, message);
        }
        ClientMessage::TrackLoaded { id } => {
            jukebox.confirm_playback(id);
        }
        ClientMessage::Position {
            id,
            position,
            duration,
        } => {
            jukebox.report_position(id, position, duration);
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/", get(gateway))
}
