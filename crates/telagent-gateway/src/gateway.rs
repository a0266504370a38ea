// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Entry point: builds the axum router (carrier signalling POST + media
//! WebSocket upgrade), wires C1 through C8 together per business, and serves
//! until shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use telagent_config::{BusinessConfig, GatewayConfig, TenantRegistry};
use telagent_drivers::{
    CallRedirectHook, KnowledgeSnippet, LoggingEmailDriver, LoggingRedirectHook,
    LoggingSmsDriver, RetrievalDriver, StaticRetrievalDriver,
};
use telagent_tools::{
    ScheduleAppointmentTool, SearchKnowledgeBaseTool, ToolRegistry, TransferToHumanTool,
    UpdateUserInfoTool,
};

use crate::call::{self, CallSetup};
use crate::carrier;
use crate::notifier::Notifier;
use crate::security;

struct GatewayState {
    config: GatewayConfig,
    registry: Arc<TenantRegistry>,
    carrier_secret: Option<Vec<u8>>,
    redirect_hook: Arc<dyn CallRedirectHook>,
    notifier: Arc<Notifier>,
}

/// Starts the gateway and serves until the process is killed. This is the
/// function `telagent`'s CLI `gateway start` subcommand calls directly.
pub async fn run(config: GatewayConfig, registry: TenantRegistry) -> anyhow::Result<()> {
    let carrier_secret = match &config.http.carrier_signature_secret_env {
        Some(var) => Some(
            std::env::var(var)
                .map_err(|_| anyhow::anyhow!("environment variable {var} is not set"))?
                .into_bytes(),
        ),
        None => {
            tracing::warn!("no carrier signature secret configured; call-setup requests are accepted unverified");
            None
        }
    };

    let state = Arc::new(GatewayState {
        config: config.clone(),
        registry: Arc::new(registry),
        carrier_secret,
        redirect_hook: Arc::new(LoggingRedirectHook::default()),
        notifier: Arc::new(Notifier::new(
            None,
            Arc::new(LoggingEmailDriver::default()),
            Arc::new(LoggingSmsDriver::default()),
        )),
    });

    let app = Router::new()
        .route("/voice/incoming", post(incoming_call))
        .route("/media", get(media_upgrade))
        .layer(axum::middleware::from_fn(security::security_headers))
        .layer(axum::middleware::from_fn(security::csrf_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(bind = %config.http.bind, "telagent gateway listening");
    let listener = tokio::net::TcpListener::bind(&config.http.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// C1: carrier call-setup POST handler (§4.1, §6).
async fn incoming_call(
    State(state): State<Arc<GatewayState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Some(secret) = &state.carrier_secret {
        let signature = headers.get("x-carrier-signature").and_then(|v| v.to_str().ok()).unwrap_or("");
        let host = headers.get(axum::http::header::HOST).and_then(|v| v.to_str().ok()).unwrap_or("");
        let full_url = format!("https://{host}{uri}");
        if !carrier::verify_signature(secret, &full_url, body.as_bytes(), signature) {
            tracing::warn!("rejected call-setup request with invalid signature");
            return (StatusCode::OK, carrier::rejection_directive("This call cannot be completed at this time."), [("content-type", "application/xml")]).into_response();
        }
    }

    let setup = match carrier::parse_call_setup(&body) {
        Ok(setup) => setup,
        Err(e) => {
            tracing::warn!(error = %e, "malformed call-setup body");
            return (StatusCode::OK, [("content-type", "application/xml")], carrier::rejection_directive("This call cannot be completed at this time.")).into_response();
        }
    };

    let business_id = match state.registry.business_id_from_phone(&setup.to) {
        Ok(id) => id,
        Err(_) => {
            tracing::info!(to = %setup.to, "no business configured for called number");
            return (StatusCode::OK, [("content-type", "application/xml")], carrier::rejection_directive("This number is not currently in service.")).into_response();
        }
    };

    let directive = carrier::streaming_directive(&state.config.http.public_media_url, &business_id, &setup.from, &setup.to);
    (StatusCode::OK, [("content-type", "application/xml")], directive).into_response()
}

/// C2/C3 entry: upgrades the carrier's media WebSocket. The call's business
/// is resolved just after the upgrade, from the `start` frame's embedded
/// parameters (the same `{businessId, from, to}` set C1 handed the carrier).
async fn media_upgrade(State(state): State<Arc<GatewayState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_media_socket(socket, state).await {
            tracing::warn!(error = %e, "call ended with an error");
        }
    })
}

async fn handle_media_socket(mut socket: axum::extract::ws::WebSocket, state: Arc<GatewayState>) -> anyhow::Result<()> {
    use axum::extract::ws::Message;
    use futures::StreamExt;

    let Some(Ok(Message::Text(first))) = socket.next().await else {
        anyhow::bail!("media socket closed before sending a start frame");
    };
    let start: StartFrame = serde_json::from_str(&first)?;
    let business_id = start
        .start
        .custom_parameters
        .get("businessId")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("start frame is missing the businessId parameter"))?;

    let business = state.registry.get_config(&business_id)?;
    let tools = Arc::new(build_tool_registry(&business, state.redirect_hook.clone()));

    let setup = CallSetup {
        business_id,
        business,
        tools,
        limits: state.config.call.clone(),
        realtime_cfg: state.config.realtime.clone(),
        redirect_hook: state.redirect_hook.clone(),
        notifier: state.notifier.clone(),
    };

    call::run_call(socket, start.start.stream_sid, setup).await
}

#[derive(serde::Deserialize)]
struct StartFrame {
    start: StartPayload,
}

#[derive(serde::Deserialize)]
struct StartPayload {
    #[serde(rename = "streamSid")]
    stream_sid: String,
    #[serde(default, rename = "customParameters")]
    custom_parameters: HashMap<String, String>,
}

/// Builds the tool catalogue this business's tenant exposes. Tenant
/// isolation (§8 invariant 7): the set of tools is a pure function of the
/// business's own feature flags, never of call-time input.
fn build_tool_registry(business: &BusinessConfig, redirect_hook: Arc<dyn CallRedirectHook>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(UpdateUserInfoTool::default());

    if business.feature_flags.rag_enabled {
        let retrieval: Arc<dyn RetrievalDriver> = Arc::new(StaticRetrievalDriver::new(company_info_snippets(business)));
        registry.register(SearchKnowledgeBaseTool::new(retrieval));
    }
    if business.feature_flags.appointment_booking_enabled {
        registry.register(ScheduleAppointmentTool);
    }
    if business.feature_flags.emergency_enabled {
        registry.register(TransferToHumanTool::new(redirect_hook));
    }

    registry
}

fn company_info_snippets(business: &BusinessConfig) -> Vec<KnowledgeSnippet> {
    let info = &business.company_info;
    let mut snippets = Vec::new();
    if let Some(hours) = &info.hours {
        snippets.push(KnowledgeSnippet { title: "Hours".to_string(), text: hours.clone() });
    }
    if let Some(address) = &info.address {
        snippets.push(KnowledgeSnippet { title: "Location".to_string(), text: address.clone() });
    }
    if !info.service_areas.is_empty() {
        snippets.push(KnowledgeSnippet {
            title: "Service areas".to_string(),
            text: info.service_areas.join(", "),
        });
    }
    if let Some(phone) = &info.phone {
        snippets.push(KnowledgeSnippet { title: "Phone".to_string(), text: phone.clone() });
    }
    snippets
}
