// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The per-call actor task (§5, §9): one task owns a [`telagent_core::Session`]
//! exclusively for the lifetime of a call, driving the carrier media
//! WebSocket, the [`MediaBridge`], and the upstream [`RealtimeClient`] from a
//! single `tokio::select!` loop rather than sharing the session behind a
//! mutex.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use base64::Engine;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;

use telagent_config::{BusinessConfig, CallLimits, RealtimeConfig};
use telagent_core::Session;
use telagent_drivers::CallRedirectHook;
use telagent_scheduler::{run_tool_with_timeout, CallDeadline};
use telagent_tools::{ToolCall, ToolContext, ToolRegistry};

use crate::bridge::MediaBridge;
use crate::notifier::Notifier;
use crate::realtime::{self, RealtimeClient, UpstreamEvent};

/// Inbound carrier media-WebSocket events (§6).
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum CarrierEvent {
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
    Media { media: CarrierMediaPayload },
    Dtmf { dtmf: CarrierDtmfPayload },
    Stop,
}

#[derive(Debug, Deserialize)]
struct CarrierMediaPayload {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct CarrierDtmfPayload {
    digit: String,
}

/// Everything a call needs that is shared across calls and resolved once at
/// connection time by [`crate::gateway`].
pub struct CallSetup {
    pub business_id: String,
    pub business: BusinessConfig,
    pub tools: Arc<ToolRegistry>,
    pub limits: CallLimits,
    pub realtime_cfg: RealtimeConfig,
    pub redirect_hook: Arc<dyn CallRedirectHook>,
    pub notifier: Arc<Notifier>,
}

/// Drives one call end to end: connects upstream, bridges carrier media,
/// dispatches tool calls, and hands the finished session to the notifier.
///
/// `stream_sid` is the carrier's stream identifier, already read off the
/// media socket's `start` frame by [`crate::gateway`] (which also uses that
/// frame's embedded parameters to resolve `setup.business_id`).
pub async fn run_call(socket: WebSocket, stream_sid: String, setup: CallSetup) -> anyhow::Result<()> {
    let CallSetup { business_id, business, tools, limits, realtime_cfg, redirect_hook, notifier } = setup;

    let (mut carrier_tx, mut carrier_rx) = socket.split();

    let mut session = Session::new(&business_id);
    let mut bridge = MediaBridge::new(limits.pacing_queue_cap_ms)?;

    let api_key = std::env::var(&realtime_cfg.api_key_env)
        .map_err(|_| anyhow::anyhow!("environment variable {} is not set", realtime_cfg.api_key_env))?;
    let mut upstream = RealtimeClient::connect(&realtime_cfg.url, &api_key).await?;

    let voice = realtime_cfg.default_voice.clone();
    upstream
        .send(&realtime::build_session_update(&realtime_cfg, &voice, &business.prompt, &tools.schemas()))
        .await?;
    for msg in realtime::session_start_messages() {
        upstream.send(&msg).await?;
    }

    let mut deadline = CallDeadline::new(&limits);
    let mut pacer = tokio::time::interval(Duration::from_millis(20));

    'call: loop {
        tokio::select! {
            biased;

            _ = deadline.expired() => {
                tracing::info!(call_id = %session.id, %business_id, "call reached its hard timeout");
                break 'call;
            }

            _ = pacer.tick() => {
                if let Some(frame) = bridge.next_outbound_frame() {
                    let payload = base64::engine::general_purpose::STANDARD.encode(&frame);
                    let envelope = json!({
                        "event": "media",
                        "streamSid": stream_sid,
                        "media": { "payload": payload },
                    });
                    if carrier_tx.send(WsMessage::Text(envelope.to_string())).await.is_err() {
                        break 'call;
                    }
                }
            }

            carrier_msg = carrier_rx.next() => {
                match carrier_msg {
                    None => {
                        tracing::info!(call_id = %session.id, %business_id, "carrier media socket closed");
                        break 'call;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(call_id = %session.id, error = %e, "carrier media socket protocol error");
                        break 'call;
                    }
                    Some(Ok(WsMessage::Close(_))) => break 'call,
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<CarrierEvent>(&text) {
                            Ok(CarrierEvent::Start { .. }) => {}
                            Ok(CarrierEvent::Media { media }) => {
                                let Ok(mulaw) = base64::engine::general_purpose::STANDARD.decode(media.payload) else {
                                    tracing::warn!(call_id = %session.id, "skipping undecodable media frame");
                                    continue;
                                };
                                let pcm24k = bridge.process_inbound(&mulaw);
                                if !pcm24k.is_empty() {
                                    let bytes: Vec<u8> = pcm24k.iter().flat_map(|s| s.to_le_bytes()).collect();
                                    let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
                                    let _ = upstream.send(&json!({
                                        "type": "input_audio_buffer.append",
                                        "audio": b64,
                                    })).await;
                                }
                            }
                            Ok(CarrierEvent::Dtmf { dtmf }) => {
                                if business.feature_flags.emergency_enabled
                                    && MediaBridge::is_emergency_digit(&dtmf.digit, &business.emergency_digit)
                                {
                                    if let Some(target) = &business.emergency_transfer_number {
                                        tracing::warn!(call_id = %session.id, %business_id, "emergency DTMF received, redirecting call");
                                        let _ = redirect_hook.redirect(&session.id.to_string(), target).await;
                                        break 'call;
                                    }
                                }
                            }
                            Ok(CarrierEvent::Stop) => break 'call,
                            Err(e) => {
                                tracing::warn!(call_id = %session.id, error = %e, "malformed carrier media frame");
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                }
            }

            event = upstream.next_event() => {
                match event {
                    Ok(None) => {
                        tracing::info!(call_id = %session.id, %business_id, "upstream realtime session closed");
                        break 'call;
                    }
                    Err(e) => {
                        tracing::warn!(call_id = %session.id, error = %e, "upstream realtime session error");
                        break 'call;
                    }
                    Ok(Some(ev)) => {
                        handle_upstream_event(ev, &mut session, &mut bridge, &mut upstream, &tools, &business, &limits).await;
                    }
                }
            }
        }
    }

    let _ = upstream.close().await;
    notifier.notify(&session, &business).await;
    Ok(())
}

async fn handle_upstream_event(
    event: UpstreamEvent,
    session: &mut Session,
    bridge: &mut MediaBridge,
    upstream: &mut RealtimeClient,
    tools: &ToolRegistry,
    business: &BusinessConfig,
    limits: &CallLimits,
) {
    match event {
        UpstreamEvent::SpeechStarted => {
            if session.is_responding {
                let _ = upstream.send(&realtime::cancel_response_message()).await;
            }
            bridge.barge_in();
            session.barge_in();
        }
        UpstreamEvent::SpeechStopped => {}
        UpstreamEvent::TranscriptionCompleted { text } => {
            session.append_history("caller", &text);

            // Fallback extractor (§4.5): keeps Session.user_info populated
            // even when the model never calls update_user_info itself, and
            // tells the model what was captured so it doesn't re-ask.
            let found = telagent_core::extract(&text);
            let mut captured = Vec::new();
            if let (None, Some(name)) = (&session.user_info.name, &found.name) {
                session.user_info.name = Some(name.clone());
                captured.push(format!("name is {name}"));
            }
            if let (None, Some(email)) = (&session.user_info.email, &found.email) {
                session.user_info.email = Some(email.clone());
                captured.push(format!("email is {email}"));
            }
            if !captured.is_empty() {
                let note = format!("The caller's {} (captured automatically).", captured.join(" and "));
                let _ = upstream.send(&realtime::user_info_captured_message(&note)).await;
            }
        }
        UpstreamEvent::ResponseCreated { response_id } => {
            session.active_response_id = Some(response_id);
            session.is_responding = true;
            session.clear_barge_in();
        }
        UpstreamEvent::AudioDelta { base64: b64 } => {
            // Normally response.created already set is_responding; this
            // covers providers that skip straight to audio deltas.
            if !session.is_responding {
                session.is_responding = true;
                session.clear_barge_in();
            }
            if session.suppress_audio {
                return;
            }
            if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(b64) {
                let pcm: Vec<i16> = bytes
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]))
                    .collect();
                bridge.process_outbound(&pcm);
            }
        }
        UpstreamEvent::TranscriptDelta { text } => {
            session.append_history("agent", &text);
        }
        UpstreamEvent::TranscriptDone => {}
        UpstreamEvent::FunctionCallArgumentsDone { call_id, name, arguments } => {
            let args = serde_json::from_str(&arguments).unwrap_or(serde_json::Value::Null);
            let call = ToolCall { id: call_id.clone(), name, args };
            let mut ctx = ToolContext { session, business };
            let output = match run_tool_with_timeout(limits, tools.execute(&call, &mut ctx)).await {
                Ok(out) => out,
                Err(_) => telagent_tools::ToolOutput::err(
                    &call_id,
                    "That's taking longer than expected. I can connect you with someone who can help.",
                ),
            };
            for msg in realtime::function_call_output_message(&call_id, &output.content) {
                let _ = upstream.send(&msg).await;
            }
        }
        UpstreamEvent::ResponseDone => {
            session.is_responding = false;
            session.active_response_id = None;
            session.clear_barge_in();
        }
        UpstreamEvent::Error { message } => {
            tracing::warn!(call_id = %session.id, %message, "upstream reported a transient error");
        }
        UpstreamEvent::Unknown => {}
    }
}
