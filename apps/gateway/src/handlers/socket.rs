// [apps/gateway/src/handlers/socket.rs]
//! The duplex `/v1/stream` endpoint. A triple-task handler: an
//! internal worker decouples message processing from the network
//! read/write loops, and the first of the three tasks to finish
//! aborts the other two for deterministic teardown.

use crate::services::pipeline_orchestrator::{self, CaptureOutcome, ExecuteOutcome};
use crate::services::token_validator::{validate_token, ValidatedIdentity};
use crate::state::{AppState, IdentityContext};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use base64::Engine;
use futures::{SinkExt, StreamExt};
use myndlens_domain_models::ws::{
    AudioChunkPayload, AuthFailPayload, AuthOkPayload, AuthPayload, CancelPayload, ErrorPayload,
    ExecuteBlockedPayload, ExecuteOkPayload, ExecuteRequestPayload, HeartbeatAckPayload, HeartbeatPayload,
    TextInputPayload, TranscriptPayload,
};
use myndlens_domain_models::{AuditEvent, AuditEventType, ConversationPhase, Envelope, MessageType, Session};
use myndlens_pipeline::{analyze_fragment, route_fragment, Route};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

const KEEPALIVE_INTERVAL_SECONDS: u64 = 25;
const COMMAND_BUFFER_CAPACITY: usize = 32;
const AUTH_TIMEOUT_SECONDS: u64 = 10;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_duplex(socket, state))
}

async fn handle_duplex(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let first_message = match tokio::time::timeout(Duration::from_secs(AUTH_TIMEOUT_SECONDS), receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        _ => {
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    let Some(session_id) = authenticate(&state, &mut sender, &first_message).await else {
        let _ = sender.send(Message::Close(None)).await;
        return;
    };

    let mut push_receiver = state.push.register(&session_id);
    info!(session_id = %session_id, "session uplink established");

    let (command_tx, mut command_rx) = mpsc::channel::<String>(COMMAND_BUFFER_CAPACITY);

    let worker_state = state.clone();
    let worker_session_id = session_id.clone();
    let mut worker_task = tokio::spawn(async move {
        while let Some(raw) = command_rx.recv().await {
            process_message(&worker_state, &worker_session_id, &raw).await;
        }
    });

    let mut sender_task = tokio::spawn(async move {
        let mut keepalive = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECONDS));
        loop {
            tokio::select! {
                _ = keepalive.tick() => {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
                envelope = push_receiver.recv() => {
                    match envelope {
                        Some(envelope) => {
                            let Ok(text) = serde_json::to_string(&envelope) else { continue };
                            if sender.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    });

    let receiver_session_id = session_id.clone();
    let mut receiver_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if command_tx.send(text).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!(session_id = %receiver_session_id, "client closed uplink");
                    break;
                }
                Err(e) => {
                    warn!(session_id = %receiver_session_id, error = %e, "uplink read error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut sender_task) => { receiver_task.abort(); worker_task.abort(); }
        _ = (&mut receiver_task) => { sender_task.abort(); worker_task.abort(); }
        _ = (&mut worker_task) => { sender_task.abort(); receiver_task.abort(); }
    }

    state.store.sessions.terminate(&session_id);
    state.push.unregister(&session_id);
    state.identities.remove(&session_id);
    state.store.audit.record(AuditEvent::new(AuditEventType::SessionTerminated).with_session(&session_id));
    info!(session_id = %session_id, "session uplink terminated");
}

/// Reads and validates the mandatory first `AUTH` message. Returns
/// the newly minted session id on success, after having already sent
/// `AUTH_OK`/`AUTH_FAIL` over the wire.
async fn authenticate(
    state: &AppState,
    sender: &mut (impl futures::Sink<Message, Error = axum::Error> + Unpin),
    raw: &str,
) -> Option<String> {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(e) if e.message_type == MessageType::Auth => e,
        _ => {
            let fail = Envelope::new(
                MessageType::AuthFail,
                AuthFailPayload { reason: "first message must be AUTH".into(), code: "AUTH_ERROR".into() },
            );
            let _ = sender.send(Message::Text(serde_json::to_string(&fail).ok()?)).await;
            return None;
        }
    };

    let payload: AuthPayload = serde_json::from_value(envelope.payload).ok()?;

    let identity = match validate_token(&state.settings, state.jwks.as_ref(), &payload.token, &payload.device_id) {
        Ok(identity) => identity,
        Err(e) => {
            state.store.audit.record(
                AuditEvent::new(AuditEventType::AuthFailure).with_detail("reason", e.to_string()),
            );
            let fail = Envelope::new(MessageType::AuthFail, AuthFailPayload { reason: e.to_string(), code: e.code().to_string() });
            let _ = sender.send(Message::Text(serde_json::to_string(&fail).ok()?)).await;
            return None;
        }
    };

    let env = crate::services::token_validator::effective_env(&identity, &state.settings.env);
    let (user_id, device_id, tenant_id, subscription_status) = match &identity {
        ValidatedIdentity::Sso { user_id, tenant_id, subscription_status, .. } => {
            (user_id.clone(), payload.device_id.clone(), tenant_id.clone(), subscription_status.clone())
        }
        ValidatedIdentity::Legacy { user_id, device_id, .. } => {
            (user_id.clone(), device_id.clone(), "default".to_string(), "ACTIVE".to_string())
        }
    };

    let session = Session::new(user_id.clone(), device_id, env.clone(), payload.client_version.clone());
    let session = state.store.sessions.create_with_migration(session);

    state.identities.insert(
        session.session_id.clone(),
        IdentityContext { tenant_id, subscription_status, dispatch_target_env: env },
    );

    state.store.audit.record(AuditEvent::new(AuditEventType::AuthSuccess).with_session(&session.session_id));

    let ok = Envelope::new(
        MessageType::AuthOk,
        AuthOkPayload {
            session_id: session.session_id.clone(),
            user_id,
            heartbeat_interval_ms: state.settings.heartbeat_interval_s * 1000,
        },
    );
    sender.send(Message::Text(serde_json::to_string(&ok).ok()?)).await.ok()?;

    Some(session.session_id)
}

/// Dispatches one inbound envelope by message type. Runs on the
/// internal worker task so a slow pipeline run never blocks reading
/// the next frame off the wire.
async fn process_message(state: &AppState, session_id: &str, raw: &str) {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(e) => e,
        Err(e) => {
            warn!(session_id, error = %e, "malformed message, keeping connection open");
            return;
        }
    };

    match envelope.message_type {
        MessageType::Heartbeat => handle_heartbeat(state, session_id, envelope),
        MessageType::TextInput => handle_text_input(state, session_id, envelope).await,
        MessageType::AudioChunk => handle_audio_chunk(state, session_id, envelope).await,
        MessageType::ExecuteRequest => handle_execute_request(state, session_id, envelope).await,
        MessageType::Cancel => handle_cancel(state, session_id, envelope),
        other => {
            warn!(session_id, message_type = ?other, "unexpected client->server message type");
            push_error(state, session_id, "unsupported message type for this direction", "UNKNOWN_MSG_TYPE");
        }
    }
}

fn handle_heartbeat(state: &AppState, session_id: &str, envelope: Envelope) {
    let Ok(payload) = serde_json::from_value::<HeartbeatPayload>(envelope.payload) else {
        push_error(state, session_id, "malformed HEARTBEAT payload", "BAD_PAYLOAD");
        return;
    };
    if state.store.sessions.heartbeat(session_id, payload.seq).is_none() {
        return;
    }
    let ack = Envelope::new(
        MessageType::HeartbeatAck,
        HeartbeatAckPayload { seq: payload.seq, server_ts: chrono::Utc::now().timestamp_millis() },
    );
    state.push.push(session_id, ack);
}

async fn handle_text_input(state: &AppState, session_id: &str, envelope: Envelope) {
    let Ok(payload) = serde_json::from_value::<TextInputPayload>(envelope.payload) else {
        push_error(state, session_id, "malformed TEXT_INPUT payload", "BAD_PAYLOAD");
        return;
    };
    ingest_fragment(state, session_id, payload.text, true).await;
}

async fn handle_audio_chunk(state: &AppState, session_id: &str, envelope: Envelope) {
    let Ok(payload) = serde_json::from_value::<AudioChunkPayload>(envelope.payload) else {
        push_error(state, session_id, "malformed AUDIO_CHUNK payload", "BAD_PAYLOAD");
        return;
    };

    let text = if state.settings.mock_stt {
        base64::engine::general_purpose::STANDARD
            .decode(&payload.audio_base64)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| "[unintelligible audio]".to_string())
    } else {
        "[unintelligible audio]".to_string()
    };

    ingest_fragment(state, session_id, text, false).await;
}

/// Routes, accumulates, and (when the capture window closes) runs the
/// mandate pipeline for one utterance. Text input is
/// treated as a complete utterance and always closes its own capture;
/// audio fragments accumulate until the 5-minute window elapses.
async fn ingest_fragment(state: &AppState, session_id: &str, text: String, is_text_input: bool) {
    let decision = route_fragment(&text);
    if !matches!(decision.route, Route::IntentFragment) {
        return;
    }

    let context = state.store.sessions.with_conversation(session_id, |c| c.combined_transcript()).unwrap_or_default();
    let analysis = analyze_fragment(state.llm_provider.as_ref(), &text, &context).await;

    let transcript_payload = TranscriptPayload { session_id: session_id.to_string(), text: text.clone() };
    let message_type = if is_text_input { MessageType::TranscriptFinal } else { MessageType::TranscriptPartial };
    state.push.push(session_id, Envelope::new(message_type, &transcript_payload));

    let window_elapsed = state
        .store
        .sessions
        .with_conversation(session_id, |c| {
            c.add_fragment(text, analysis.sub_intents, analysis.confidence);
            c.is_capture_window_elapsed()
        })
        .unwrap_or(false);

    if is_text_input || window_elapsed {
        close_capture(state, session_id).await;
    }
}

async fn close_capture(state: &AppState, session_id: &str) {
    state.store.sessions.with_conversation(session_id, |c| c.phase = ConversationPhase::Processing);

    match pipeline_orchestrator::process_capture_close(state, session_id).await {
        CaptureOutcome::Draft { .. } => {
            info!(session_id, "draft ready for confirmation");
        }
        CaptureOutcome::Blocked { reason } => {
            state.store.sessions.with_conversation(session_id, |c| c.reset());
            push_error(state, session_id, &reason, "CAPTURE_BLOCKED");
        }
    }
}

async fn handle_execute_request(state: &AppState, session_id: &str, envelope: Envelope) {
    let Ok(payload) = serde_json::from_value::<ExecuteRequestPayload>(envelope.payload) else {
        push_error(state, session_id, "malformed EXECUTE_REQUEST payload", "BAD_PAYLOAD");
        return;
    };

    let Some(identity) = state.identities.get(session_id).map(|e| e.clone()) else {
        push_error(state, session_id, "no identity context for session", "AUTH_ERROR");
        return;
    };

    if identity.subscription_status != "ACTIVE" {
        let blocked = ExecuteBlockedPayload {
            reason: "subscription is not active".into(),
            code: myndlens_domain_models::ws::ExecuteBlockedCode::SubscriptionInactive,
            draft_id: Some(payload.draft_id.clone()),
        };
        state.push.push(session_id, Envelope::new(MessageType::ExecuteBlocked, &blocked));
        return;
    }

    state.store.audit.record(
        AuditEvent::new(AuditEventType::ExecuteRequested)
            .with_session(session_id)
            .with_detail("draft_id", payload.draft_id.clone()),
    );

    let device_id = state.store.sessions.get(session_id).map(|s| s.device_id).unwrap_or_default();

    let outcome = pipeline_orchestrator::execute_draft(
        state,
        session_id,
        &device_id,
        &payload.draft_id,
        &identity.tenant_id,
        &identity.dispatch_target_env,
        payload.touch_token.as_deref(),
        payload.biometric_proof.is_some(),
    )
    .await;

    match outcome {
        ExecuteOutcome::Ok { mio_id, dispatch_id } => {
            let ok = ExecuteOkPayload { draft_id: payload.draft_id, mio_id, dispatch_id };
            state.push.push(session_id, Envelope::new(MessageType::ExecuteOk, &ok));
            state.store.sessions.with_conversation(session_id, |c| c.reset());
        }
        ExecuteOutcome::Blocked { code, reason } => {
            state.store.audit.record(
                AuditEvent::new(AuditEventType::ExecuteBlocked)
                    .with_session(session_id)
                    .with_detail("reason", reason.clone()),
            );
            let blocked = ExecuteBlockedPayload { reason, code, draft_id: Some(payload.draft_id) };
            state.push.push(session_id, Envelope::new(MessageType::ExecuteBlocked, &blocked));
        }
    }
}

fn handle_cancel(state: &AppState, session_id: &str, envelope: Envelope) {
    if serde_json::from_value::<CancelPayload>(envelope.payload).is_err() {
        push_error(state, session_id, "malformed CANCEL payload", "BAD_PAYLOAD");
        return;
    }
    state.store.sessions.with_conversation(session_id, |c| c.reset());
}

fn push_error(state: &AppState, session_id: &str, message: &str, code: &str) {
    let error = Envelope::new(MessageType::Error, ErrorPayload { message: message.to_string(), code: code.to_string() });
    state.push.push(session_id, error);
}
