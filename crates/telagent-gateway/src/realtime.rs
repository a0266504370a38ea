// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Realtime Session (C3, §4.3): the outbound WebSocket to the upstream
//! speech-to-speech model provider. Session configuration, event demuxing,
//! and the synthetic opening turn live here; tool dispatch and Session
//! mutation happen one layer up, in [`crate::call`].
//!
//! The connection shape — split into a sink/stream pair, looped over
//! incoming frames while an internal channel feeds outgoing ones — mirrors
//! this codebase's other outbound-WebSocket client.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use telagent_config::RealtimeConfig;
use telagent_tools::ToolSchema;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("failed to connect to upstream realtime provider: {0}")]
    Connect(String),
    #[error("upstream websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed upstream event: {0}")]
    Malformed(String),
}

/// Synthetic token inserted as the opening user turn so the model's own
/// system prompt drives the greeting (§4.3).
pub const SESSION_START_TOKEN: &str = "[SESSION_START]";

/// Builds the `session.update` payload for this call's business (§4.3).
pub fn build_session_update(cfg: &RealtimeConfig, voice: &str, instructions: &str, tools: &[ToolSchema]) -> Value {
    let tool_defs: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
            })
        })
        .collect();

    json!({
        "type": "session.update",
        "session": {
            "instructions": instructions,
            "voice": voice,
            "input_audio_format": "pcm16",
            "output_audio_format": "pcm16",
            "turn_detection": {
                "type": "server_vad",
                "threshold": cfg.vad_threshold,
                "prefix_padding_ms": cfg.prefix_padding_ms,
                "silence_duration_ms": cfg.silence_duration_ms,
                "create_response": true,
                "interrupt_response": true,
            },
            "tools": tool_defs,
            "tool_choice": "auto",
            "temperature": cfg.temperature,
        }
    })
}

/// The two messages that trigger the opening turn: a synthetic user item
/// carrying [`SESSION_START_TOKEN`], then a response request.
pub fn session_start_messages() -> [Value; 2] {
    [
        json!({
            "type": "conversation.item.create",
            "item": {
                "type": "message",
                "role": "user",
                "content": [{ "type": "input_text", "text": SESSION_START_TOKEN }]
            }
        }),
        json!({ "type": "response.create" }),
    ]
}

pub fn cancel_response_message() -> Value {
    json!({ "type": "response.cancel" })
}

pub fn request_response_message() -> Value {
    json!({ "type": "response.create" })
}

pub fn function_call_output_message(call_id: &str, output: &str) -> [Value; 2] {
    [
        json!({
            "type": "conversation.item.create",
            "item": {
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            }
        }),
        json!({ "type": "response.create" }),
    ]
}

/// Synthetic acknowledgement for the §4.5 fallback extractor: not a tool
/// call, just a system item telling the model what was just captured so it
/// doesn't re-ask for information the caller already gave.
pub fn user_info_captured_message(note: &str) -> Value {
    json!({
        "type": "conversation.item.create",
        "item": {
            "type": "message",
            "role": "system",
            "content": [{ "type": "input_text", "text": note }]
        }
    })
}

/// Logical view of upstream events (§4.3 table), decoupled from the
/// provider's exact wire field names.
#[derive(Debug, Clone)]
pub enum UpstreamEvent {
    SpeechStarted,
    SpeechStopped,
    TranscriptionCompleted { text: String },
    ResponseCreated { response_id: String },
    AudioDelta { base64: String },
    TranscriptDelta { text: String },
    TranscriptDone,
    FunctionCallArgumentsDone { call_id: String, name: String, arguments: String },
    ResponseDone,
    Error { message: String },
    Unknown,
}

pub fn parse_event(raw: &Value) -> UpstreamEvent {
    match raw.get("type").and_then(Value::as_str).unwrap_or("") {
        "input_audio_buffer.speech_started" => UpstreamEvent::SpeechStarted,
        "input_audio_buffer.speech_stopped" => UpstreamEvent::SpeechStopped,
        "conversation.item.input_audio_transcription.completed" => UpstreamEvent::TranscriptionCompleted {
            text: raw.get("transcript").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        "response.created" => UpstreamEvent::ResponseCreated {
            response_id: raw
                .get("response")
                .and_then(|r| r.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "response.audio.delta" => UpstreamEvent::AudioDelta {
            base64: raw.get("delta").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        "response.audio_transcript.delta" => UpstreamEvent::TranscriptDelta {
            text: raw.get("delta").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        "response.audio_transcript.done" => UpstreamEvent::TranscriptDone,
        "response.function_call_arguments.done" => UpstreamEvent::FunctionCallArgumentsDone {
            call_id: raw.get("call_id").and_then(Value::as_str).unwrap_or_default().to_string(),
            name: raw.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            arguments: raw.get("arguments").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        "response.done" => UpstreamEvent::ResponseDone,
        "error" => UpstreamEvent::Error {
            message: raw
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown upstream error")
                .to_string(),
        },
        _ => UpstreamEvent::Unknown,
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Owns the long-lived outbound connection for one call.
pub struct RealtimeClient {
    ws: WsStream,
}

impl RealtimeClient {
    pub async fn connect(url: &str, api_key: &str) -> Result<Self, RealtimeError> {
        let mut request = url.into_client_request().map_err(|e| RealtimeError::Connect(e.to_string()))?;
        request
            .headers_mut()
            .insert(AUTHORIZATION, format!("Bearer {api_key}").parse().map_err(|_| {
                RealtimeError::Connect("invalid API key header value".to_string())
            })?);
        let (ws, _response) = connect_async(request).await.map_err(|e| RealtimeError::Connect(e.to_string()))?;
        Ok(Self { ws })
    }

    pub async fn send(&mut self, value: &Value) -> Result<(), RealtimeError> {
        self.ws.send(Message::Text(value.to_string())).await?;
        Ok(())
    }

    /// Reads the next text frame and decodes it into an [`UpstreamEvent`].
    /// Returns `Ok(None)` when the connection closes normally.
    pub async fn next_event(&mut self) -> Result<Option<UpstreamEvent>, RealtimeError> {
        loop {
            match self.ws.next().await {
                None => return Ok(None),
                Some(Ok(Message::Text(text))) => {
                    let raw: Value = serde_json::from_str(&text).map_err(|e| RealtimeError::Malformed(e.to_string()))?;
                    return Ok(Some(parse_event(&raw)));
                }
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/binary carry no session-level meaning here
                Some(Err(e)) => return Err(RealtimeError::Ws(e)),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), RealtimeError> {
        self.ws.close(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_speech_started() {
        let raw = json!({ "type": "input_audio_buffer.speech_started" });
        assert!(matches!(parse_event(&raw), UpstreamEvent::SpeechStarted));
    }

    #[test]
    fn parses_response_created() {
        let raw = json!({ "type": "response.created", "response": { "id": "resp_abc123" } });
        match parse_event(&raw) {
            UpstreamEvent::ResponseCreated { response_id } => assert_eq!(response_id, "resp_abc123"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_function_call_arguments_done() {
        let raw = json!({
            "type": "response.function_call_arguments.done",
            "call_id": "call_1",
            "name": "search_knowledge_base",
            "arguments": "{\"query\":\"hours\"}"
        });
        match parse_event(&raw) {
            UpstreamEvent::FunctionCallArgumentsDone { call_id, name, arguments } => {
                assert_eq!(call_id, "call_1");
                assert_eq!(name, "search_knowledge_base");
                assert!(arguments.contains("hours"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_error_event_message() {
        let raw = json!({ "type": "error", "error": { "message": "rate limited" } });
        match parse_event(&raw) {
            UpstreamEvent::Error { message } => assert_eq!(message, "rate limited"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_is_unknown() {
        let raw = json!({ "type": "something.new" });
        assert!(matches!(parse_event(&raw), UpstreamEvent::Unknown));
    }

    #[test]
    fn session_update_includes_tool_catalogue() {
        let cfg = RealtimeConfig::default();
        let tools = vec![ToolSchema {
            name: "search_knowledge_base".into(),
            description: "search".into(),
            parameters: json!({"type": "object"}),
        }];
        let update = build_session_update(&cfg, "alloy", "You are a receptionist.", &tools);
        let names: Vec<&str> = update["session"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["search_knowledge_base"]);
        assert_eq!(update["session"]["tool_choice"], "auto");
    }

    #[test]
    fn session_start_messages_carry_the_synthetic_token() {
        let [item, response] = session_start_messages();
        assert_eq!(item["item"]["content"][0]["text"], SESSION_START_TOKEN);
        assert_eq!(response["type"], "response.create");
    }

    #[test]
    fn user_info_captured_message_carries_the_note_as_a_system_item() {
        let msg = user_info_captured_message("Caller's name is Jane.");
        assert_eq!(msg["item"]["role"], "system");
        assert_eq!(msg["item"]["content"][0]["text"], "Caller's name is Jane.");
    }
}
