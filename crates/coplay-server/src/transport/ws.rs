//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS with the configured frame limit
//! - Login handshake on the first data frame
//! - Lifecycle: outbound writer, ping + idle timeout
//! - Decode-once then dispatch; failures are reported back as serverchat errors

use std::sync::Arc;

use axum::{
    extract::{ws::Message as WsMessage, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration, Instant};
use tracing::Instrument;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{encode, Message, Response as LoginResponse, ServerChat, UserRef};

use crate::app_state::AppState;
use crate::dispatch::Dispatched;
use crate::obs::ServerMetrics;
use crate::realtime::{Connection, RealtimeCore, RealtimeCtx, Session};
use crate::transport::codec::{decode, frame, frame_len, read_limit, Inbound};
use crate::transport::handshake::{check_login, LoginRejection};

/// Error text sent to a session whose frame exceeded `max_frame_bytes`.
pub const FRAME_TOO_LARGE: &str = "frame too large";

const IDLE_CHECK: Duration = Duration::from_millis(250);

type WsSink = SplitSink<WebSocket, WsMessage>;
type WsStream = SplitStream<WebSocket>;

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let limit = read_limit(app.cfg().server.max_frame_bytes);
    ws.max_message_size(limit)
        .on_upgrade(move |socket| async move {
            if let Err(e) = run_session(app, socket).await {
                tracing::debug!(error = %e, "session ended with error");
            }
        })
}

/// Wait for the first data frame. Control frames are skipped; `None` means the
/// peer went away first.
async fn first_frame(ws_rx: &mut WsStream, max_frame_bytes: usize) -> Option<Result<Message>> {
    while let Some(Ok(msg)) = ws_rx.next().await {
        let len = frame_len(&msg);
        if len > max_frame_bytes {
            return Some(Err(CoplayError::BadRequest(format!(
                "frame of {len} bytes exceeds {max_frame_bytes}"
            ))));
        }
        match decode(msg) {
            Ok(Inbound::Envelope(msg)) => return Some(Ok(msg)),
            Ok(Inbound::Ping(_) | Inbound::Pong(_)) => continue,
            Ok(Inbound::Close) => return None,
            Err(e) => return Some(Err(e)),
        }
    }
    None
}

async fn reject(core: &RealtimeCore, ws_tx: &mut WsSink, reason: LoginRejection) -> Result<()> {
    ServerMetrics::inc(&core.metrics.logins_rejected);
    tracing::info!(reason = reason.as_str(), "login rejected");
    let bytes = encode(reason.response().envelope())?;
    let _ = ws_tx.send(frame(bytes)).await;
    let _ = ws_tx.send(WsMessage::Close(None)).await;
    Ok(())
}

async fn run_session(app: AppState, socket: WebSocket) -> Result<()> {
    let core = app.realtime();
    let srv = &app.cfg().server;
    let (mut ws_tx, mut ws_rx) = socket.split();

    let login_wait = Duration::from_millis(srv.login_timeout_ms);
    let first = match timeout(login_wait, first_frame(&mut ws_rx, srv.max_frame_bytes)).await {
        Ok(Some(Ok(msg))) => msg,
        Ok(Some(Err(e))) => {
            ServerMetrics::inc(&core.metrics.decode_errors);
            tracing::debug!(error = %e, "unusable first frame");
            return reject(&core, &mut ws_tx, LoginRejection::ExpectedLogin).await;
        }
        Ok(None) => return Ok(()),
        Err(_) => {
            tracing::debug!("no login before timeout");
            return reject(&core, &mut ws_tx, LoginRejection::ExpectedLogin).await;
        }
    };

    let name = match check_login(srv, &core.sessions, &first) {
        Ok(name) => name,
        Err(reason) => return reject(&core, &mut ws_tx, reason).await,
    };

    let id = core.sessions.next_id();
    let me = UserRef::new(id, name.as_str());
    let (conn, out_rx) = Connection::channel(srv.outbound_queue);

    // Queue the login reply before registering so no broadcast can overtake it.
    let accepted = LoginResponse::new("login", me.clone());
    conn.try_deliver(id, encode(accepted.envelope())?)?;
    core.sessions.register(Session::new(id, name.as_str(), conn))?;
    core.metrics.session_opened();
    ServerMetrics::inc(&core.metrics.logins_accepted);

    let span = tracing::info_span!("session", id = %id, user = %name);
    span.in_scope(|| tracing::info!("logged in"));
    core.broadcast(&ServerChat::info(format!("{name} joined the game")).into_envelope())?;

    let outcome = session_loop(&app, &core, &me, ws_tx, ws_rx, out_rx)
        .instrument(span.clone())
        .await;

    core.sessions.unregister(id);
    core.metrics.session_closed();
    span.in_scope(|| tracing::info!("disconnected"));
    core.broadcast(&ServerChat::info(format!("{name} left the game")).into_envelope())?;
    outcome
}

async fn session_loop(
    app: &AppState,
    core: &Arc<RealtimeCore>,
    me: &UserRef,
    mut ws_tx: WsSink,
    mut ws_rx: WsStream,
    mut out_rx: mpsc::Receiver<Bytes>,
) -> Result<()> {
    let srv = &app.cfg().server;
    let write_timeout = Duration::from_millis(srv.write_timeout_ms);
    let ping_every = Duration::from_millis(srv.ping_interval_ms);
    let idle_timeout = Duration::from_millis(srv.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut idle_tick = tokio::time::interval(IDLE_CHECK);
    idle_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(bytes) = maybe_out else {
                    // Every sender is gone: the session was removed (kick/stop).
                    tracing::info!("session removed by server");
                    let _ = ws_tx.send(WsMessage::Close(None)).await;
                    break;
                };
                match timeout(write_timeout, ws_tx.send(frame(bytes))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(error = %e, "socket write failed");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!("socket write timed out");
                        break;
                    }
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "socket read failed");
                        break;
                    }
                    None => break,
                };
                last_activity = Instant::now();

                let len = frame_len(&msg);
                if len > srv.max_frame_bytes {
                    ServerMetrics::inc(&core.metrics.oversized_frames);
                    tracing::warn!(len, max = srv.max_frame_bytes, "oversized frame dropped");
                    let _ = core.send(me.id, ServerChat::error(FRAME_TOO_LARGE).envelope());
                    continue;
                }

                match decode(msg) {
                    Ok(Inbound::Envelope(msg)) => handle_message(app, core, me, msg).await,
                    Ok(Inbound::Ping(_) | Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        ServerMetrics::inc(&core.metrics.decode_errors);
                        tracing::debug!(error = %e, "decode failed");
                        let _ = core.send(me.id, ServerChat::error(e.to_string()).envelope());
                    }
                }
            }

            // heartbeat
            _ = ping_tick.tick() => {
                if ws_tx.send(WsMessage::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // idle check
            _ = idle_tick.tick() => {
                if last_activity.elapsed() > idle_timeout {
                    tracing::info!("idle timeout");
                    let _ = ws_tx.send(WsMessage::Close(None)).await;
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn handle_message(app: &AppState, core: &Arc<RealtimeCore>, me: &UserRef, msg: Message) {
    let kind = msg.envelope().kind().to_owned();
    let ctx = RealtimeCtx::new(me.clone(), Arc::clone(core));

    match app.dispatcher().dispatch(ctx, msg).await {
        Ok(Dispatched::Handled) => core.metrics.dispatched.inc(&kind),
        Ok(Dispatched::Dropped) => ServerMetrics::inc(&core.metrics.unrouted),
        Err(e) => {
            ServerMetrics::inc(&core.metrics.handler_errors);
            tracing::warn!(%kind, error = %e, code = e.client_code().as_str(), "handler failed");
            let _ = core.send(me.id, ServerChat::error(e.to_string()).envelope());
        }
    }
}
