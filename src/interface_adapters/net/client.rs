use crate::frameworks::config;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_client_id;
use crate::use_cases::{ClientId, GameCommand, SessionEvent, SessionOutput};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use futures_util::sink::SinkExt;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    CoordinatorClosed,
    OutboundClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let client_id = next_client_id();
    let span = info_span!("conn", client_id);
    let _enter = span.enter();

    // Register with the coordinator before anything else so no notice
    // addressed to this client can be dropped.
    let (outbound_tx, outbound_rx) =
        mpsc::channel::<SessionOutput>(config::OUTBOUND_CHANNEL_CAPACITY);
    if state
        .session_tx
        .send(SessionEvent::Connected {
            client_id,
            outbound_tx,
        })
        .await
        .is_err()
    {
        warn!("session coordinator unavailable; rejecting connection");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::ERROR,
                reason: "server unavailable".into(),
            })))
            .await;
        let _ = socket.close().await;
        return;
    }

    // Tell the client who it is so it can recognize itself in gameOver and
    // playerDisconnected broadcasts.
    let identity = ServerMessage::Identity {
        client_id: client_id.to_string(),
    };
    let identity_bytes = match send_message(&mut socket, &identity).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = ?err, "failed to send identity");
            notify_disconnected(&state, client_id).await;
            return;
        }
    };

    info!("client connected");

    let now = Instant::now() - LOG_THROTTLE;
    let mut ctx = ConnCtx {
        client_id,
        session_tx: state.session_tx.clone(),
        outbound_rx,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out: identity_bytes as u64,

        invalid_json: 0,
        last_invalid_msg_log: now,

        close_frame: None,
    };

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    // Always tell the coordinator, even on abnormal exits, so room cleanup
    // and departure notices run.
    notify_disconnected(&state, client_id).await;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        "connection stats"
    );
    info!("client disconnected");
}

async fn notify_disconnected(state: &Arc<AppState>, client_id: ClientId) {
    if state
        .session_tx
        .send(SessionEvent::Disconnected { client_id })
        .await
        .is_err()
    {
        warn!(client_id, "session coordinator unavailable during disconnect");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub client_id: ClientId,
    // Commands flowing into the session coordinator.
    pub session_tx: mpsc::Sender<SessionEvent>,
    // Notices the coordinator addressed to this client.
    pub outbound_rx: mpsc::Receiver<SessionOutput>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,
    pub last_invalid_msg_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let client_id = ctx.client_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        session_tx,
        outbound_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_invalid_msg_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming message from the client.
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    client_id,
                    session_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_invalid_msg_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing notice from the coordinator.
            notice = outbound_rx.recv() => {
                match notice {
                    Some(output) => {
                        let msg = ServerMessage::from(output);
                        match send_message(socket, &msg).await {
                            Ok(bytes) => {
                                *msgs_out += 1;
                                *bytes_out += bytes as u64;
                                false
                            }
                            Err(err) => {
                                // Log unexpected send failures; disconnect follows.
                                warn!(error = ?err, "failed to send notice");
                                true
                            }
                        }
                    }
                    None => {
                        warn!(client_id, "outbound channel closed; disconnecting");
                        fatal = Some(NetError::OutboundClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Some(err) = fatal { Err(err) } else { Ok(()) }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    client_id: ClientId,
    session_tx: &mpsc::Sender<SessionEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_invalid_msg_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => {
                        forward_command(client_id, session_tx, GameCommand::from(message)).await
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_msg_log) {
                            warn!(
                                client_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(client_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(client_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_command(
    client_id: ClientId,
    session_tx: &mpsc::Sender<SessionEvent>,
    command: GameCommand,
) -> Result<LoopControl, NetError> {
    session_tx
        .send(SessionEvent::Command { client_id, command })
        .await
        .map_err(|_| NetError::CoordinatorClosed)?;
    Ok(LoopControl::Continue)
}
