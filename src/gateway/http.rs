use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_protocol::ServerRecord;
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;

use crate::state::AppState;

#[derive(Serialize)]
struct ServerRecordDto {
    connection_string: String,
    name: String,
    version: String,
    clients_on: u8,
    clients_max: u8,
    companies_on: Option<u8>,
    companies_max: Option<u8>,
    spectators_on: u8,
    map_width: u16,
    map_height: u16,
    landscape: &'static str,
    password: bool,
    dedicated: bool,
    calendar_date: Option<i32>,
    calendar_start: Option<i32>,
    ticks_playing: Option<u64>,
    gamescript_name: Option<String>,
    gamescript_version: Option<i32>,
    newgrfs: Vec<String>,
}

impl From<&ServerRecord> for ServerRecordDto {
    fn from(r: &ServerRecord) -> Self {
        Self {
            connection_string: r.connection_string.clone(),
            name: r.name.clone(),
            version: r.version.clone(),
            clients_on: r.clients_on,
            clients_max: r.clients_max,
            companies_on: r.companies_on,
            companies_max: r.companies_max,
            spectators_on: r.spectators_on,
            map_width: r.map_width,
            map_height: r.map_height,
            landscape: r.landscape.as_str(),
            password: r.password,
            dedicated: r.dedicated,
            calendar_date: r.calendar_date,
            calendar_start: r.calendar_start,
            ticks_playing: r.ticks_playing,
            gamescript_name: r.gamescript_name.clone(),
            gamescript_version: r.gamescript_version,
            newgrfs: r.newgrfs.clone(),
        }
    }
}

/// `GET /servers`.
pub(crate) async fn list_servers(State(state): State<AppState>) -> Response {
    match state.cache.get().await {
        Ok(servers) => {
            let dtos: Vec<ServerRecordDto> = servers.iter().map(ServerRecordDto::from).collect();
            Json(dtos).into_response()
        }
        Err(e) => {
            tracing::debug!(target: "http", error = %e, "server list refresh failed");
            error_response(e)
        }
    }
}

/// `GET /resolve/:code`.
pub(crate) async fn resolve_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Response {
    if code.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing invite code" })),
        )
            .into_response();
    }

    match state.coordinator.resolve_invite(&code).await {
        Ok(bridge_protocol::InviteResolution::Direct { host, port }) => Json(json!({
            "hostname": host,
            "port": port,
            "type": "direct",
        }))
        .into_response(),
        Ok(bridge_protocol::InviteResolution::Relay { host, port, ticket }) => Json(json!({
            "hostname": host,
            "port": port,
            "type": "relay",
            "ticket": ticket,
        }))
        .into_response(),
        Err(e) => {
            tracing::debug!(target: "http", error = %e, "resolve failed");
            error_response(e)
        }
    }
}

fn error_response(e: impl Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}

/// `GET /health`.
pub(crate) async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// Handles everything the explicit routes don't: `OPTIONS *` gets a bare
/// `204` (CORS headers are added by the layer wrapping this router), any
/// other unmatched path/method is a `404`.
pub(crate) async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}
