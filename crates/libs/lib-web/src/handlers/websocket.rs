//! # Project WebSocket
//!
//! The session manager for project rooms: one WebSocket connection is one
//! session, bound to exactly one room for its whole lifetime.
//!
//! ## Endpoint
//!
//! - `GET /api/ws/projects/{project_id}` - join a project room
//!
//! The handshake refuses bad rooms before it even looks at credentials: a
//! malformed project id answers `400 Invalid projectId`, an unknown one
//! `404 Project not found`, and only then an absent/invalid/revoked token
//! `401 Authentication error`. The bearer token travels in the
//! `Authorization` header or, for clients that cannot set headers on a
//! WebSocket, in a `token` query parameter.
//!
//! After the upgrade the session runs two tasks: one forwarding room events
//! to the client (skipping events the session itself originated), one
//! feeding inbound frames into the broadcast pipeline. Either side closing
//! tears both down and the session leaves its room.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use lib_auth::{verify_credential, Identity, RevokedTokens};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::collab::{RoomError, RoomMeta, RoomRegistry, WireFrame};
use crate::server::AppState;

/// Query parameters accepted by the room handshake.
#[derive(Debug, Default, Deserialize)]
pub struct WsAuthQuery {
    /// Fallback credential slot for clients that cannot set headers.
    pub token: Option<String>,
}

/// Why a handshake was turned away before the upgrade.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct HandshakeRefusal {
    pub status: StatusCode,
    pub message: &'static str,
}

/// The credential the client presented, header first, query second.
fn credential_from(headers: &HeaderMap, query: &WsAuthQuery) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| query.token.clone())
}

/// Run the pre-upgrade checks: the room id must resolve to a real project
/// before the credential is even considered.
pub(crate) async fn authorize_handshake(
    registry: &RoomRegistry,
    revoked: &RevokedTokens,
    jwt_secret: &str,
    raw_project_id: &str,
    credential: Option<&str>,
) -> Result<(RoomMeta, Identity), HandshakeRefusal> {
    let room = registry.resolve(raw_project_id).await.map_err(|e| match e {
        RoomError::Malformed => HandshakeRefusal {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid projectId",
        },
        RoomError::NotFound => HandshakeRefusal {
            status: StatusCode::NOT_FOUND,
            message: "Project not found",
        },
        RoomError::Lookup(reason) => {
            error!("[WS] ROOM_LOOKUP_FAILED id={} error={}", raw_project_id, reason);
            HandshakeRefusal {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Project lookup failed",
            }
        }
    })?;

    let identity =
        verify_credential(credential, jwt_secret, revoked).map_err(|_| HandshakeRefusal {
            status: StatusCode::UNAUTHORIZED,
            message: "Authentication error",
        })?;

    Ok((room, identity))
}

/// WebSocket handler for a project room.
///
/// **Route**: `GET /api/ws/projects/{project_id}`
pub async fn project_websocket(
    ws: WebSocketUpgrade,
    Path(project_id): Path<String>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let credential = credential_from(&headers, &query);

    let (room, identity) = match authorize_handshake(
        &state.registry,
        &state.revoked,
        &state.config.jwt_secret,
        &project_id,
        credential.as_deref(),
    )
    .await
    {
        Ok(authorized) => authorized,
        Err(refusal) => {
            warn!(
                "[WS] HANDSHAKE_REFUSED project={} ip={} status={} reason={}",
                project_id,
                addr.ip(),
                refusal.status,
                refusal.message
            );
            return (refusal.status, refusal.message).into_response();
        }
    };

    let session_id = Uuid::new_v4();
    info!(
        session_id = %session_id,
        room = room.id,
        user_id = identity.id,
        "[WS] UPGRADE_START session={} room={} user={} ip={}",
        session_id,
        room.id,
        identity.email,
        addr.ip()
    );

    ws.on_upgrade(move |socket| async move {
        let handle = tokio::task::spawn(async move {
            handle_project_socket(socket, state, room, identity, session_id).await;
        });

        if let Err(e) = handle.await {
            error!(
                session_id = %session_id,
                error = ?e,
                "[WS] HANDLER_PANIC session={} error={:?}",
                session_id,
                e
            );
        }
    })
    .into_response()
}

/// Drive one established session until either side hangs up.
async fn handle_project_socket(
    socket: WebSocket,
    state: AppState,
    room: RoomMeta,
    identity: Identity,
    session_id: Uuid,
) {
    let room_id = room.id;
    let mut events = state.hub.join(room_id).await;
    let sessions_now = state.hub.session_count(room_id).await;

    let (mut sender, mut receiver) = socket.split();
    let connection_start = Instant::now();
    let messages_sent = Arc::new(AtomicU64::new(0));
    let messages_received = Arc::new(AtomicU64::new(0));

    info!(
        session_id = %session_id,
        room = room_id,
        user_id = identity.id,
        sessions = sessions_now,
        "[WS] CONNECTED session={} room={} user={} sessions={}",
        session_id,
        room_id,
        identity.email,
        sessions_now
    );

    // Forward room events to this client, skipping its own messages.
    let messages_sent_send = Arc::clone(&messages_sent);
    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if event.origin == Some(session_id) {
                        continue;
                    }

                    let json = match WireFrame::ProjectMessage(event.payload).encode() {
                        Ok(json) => json,
                        Err(e) => {
                            error!(
                                session_id = %session_id,
                                error = %e,
                                "[WS] SERIALIZE_ERROR session={} error={}",
                                session_id,
                                e
                            );
                            continue;
                        }
                    };

                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                    messages_sent_send.fetch_add(1, Ordering::Relaxed);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        session_id = %session_id,
                        skipped,
                        "[WS] LAGGED session={} skipped={}",
                        session_id,
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Feed inbound frames into the broadcast pipeline.
    let pipeline = state.pipeline.clone();
    let messages_received_recv = Arc::clone(&messages_received);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match WireFrame::decode(&text) {
                    Ok(WireFrame::ProjectMessage(payload)) => {
                        messages_received_recv.fetch_add(1, Ordering::Relaxed);
                        pipeline.handle_inbound(room_id, session_id, payload).await;
                    }
                    Err(e) => {
                        warn!(
                            session_id = %session_id,
                            error = %e,
                            "[WS] FRAME_REJECTED session={} size={} error={}",
                            session_id,
                            text.len(),
                            e
                        );
                    }
                },
                Ok(Message::Close(_)) => {
                    info!(
                        session_id = %session_id,
                        "[WS] CLOSE_RECEIVED session={}",
                        session_id
                    );
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Binary(data)) => {
                    warn!(
                        session_id = %session_id,
                        size = data.len(),
                        "[WS] BINARY_IGNORED session={} size={}",
                        session_id,
                        data.len()
                    );
                }
                Err(e) => {
                    error!(
                        session_id = %session_id,
                        error = %e,
                        "[WS] RECV_ERROR session={} error={}",
                        session_id,
                        e
                    );
                    break;
                }
            }
        }
    });

    // Whichever side finishes first tears the other down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.leave(room_id).await;

    let duration = connection_start.elapsed();
    info!(
        session_id = %session_id,
        room = room_id,
        user_id = identity.id,
        duration_secs = duration.as_secs_f64(),
        messages_sent = messages_sent.load(Ordering::Relaxed),
        messages_received = messages_received.load(Ordering::Relaxed),
        "[WS] DISCONNECTED session={} room={} user={} duration={:.2}s sent={} received={}",
        session_id,
        room_id,
        identity.email,
        duration.as_secs_f64(),
        messages_sent.load(Ordering::Relaxed),
        messages_received.load(Ordering::Relaxed)
    );
}
