use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use schedule_core::View;

use crate::{refresh, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/calendar", get(handle_calendar))
        .route("/calendar.ics", get(handle_ics))
        .route("/groups", get(handle_groups))
        .route("/groups/:name/toggle", post(handle_toggle_group))
        .route("/navigate/:action", post(handle_navigate))
        .route("/sidebar/toggle", post(handle_toggle_sidebar))
        .route("/instructions/dismiss", post(handle_dismiss_instructions))
        .route("/refresh", post(handle_refresh))
        .fallback(|| async { Redirect::permanent(env!("CARGO_PKG_REPOSITORY")) })
        .with_state(state)
}

#[derive(Deserialize)]
struct CalendarQuery {
    /// Pixels the renderer has for the timeline.
    height: Option<f64>,
}

async fn handle_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Response {
    let mut engine = state.engine.write().await;
    if let Some(height) = query.height {
        engine.set_available_height(height);
    }

    let response = Json(engine.presentation()).into_response();
    response
}

async fn handle_ics(State(state): State<AppState>) -> Response {
    let engine = state.engine.read().await;
    if !engine.is_available() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Schedule not loaded yet").into_response();
    }

    (
        [("content-type", "text/calendar")],
        engine.to_ics(env!("CARGO_PKG_NAME")).to_string(),
    )
        .into_response()
}

async fn handle_groups(State(state): State<AppState>) -> Response {
    let engine = state.engine.read().await;
    let response = Json(engine.groups()).into_response();
    response
}

async fn handle_toggle_group(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let mut engine = state.engine.write().await;
    if engine.color_of(&name).is_none() {
        return (StatusCode::NOT_FOUND, "Unknown group").into_response();
    }

    let selected = engine.toggle_group(&name);
    Json(serde_json::json!({ "group": name, "selected": selected })).into_response()
}

async fn handle_navigate(State(state): State<AppState>, Path(action): Path<String>) -> Response {
    let mut engine = state.engine.write().await;
    let navigation = match action.as_str() {
        "next" => engine.next(),
        "prev" => engine.prev(),
        "today" => engine.go_to_today(),
        other => match other.parse::<View>() {
            Ok(view) => engine.switch_view(view),
            Err(_) => return (StatusCode::BAD_REQUEST, "Unknown navigation action").into_response(),
        },
    };

    Json(navigation).into_response()
}

async fn handle_toggle_sidebar(State(state): State<AppState>) -> Response {
    let collapsed = state.engine.write().await.toggle_sidebar();
    Json(serde_json::json!({ "sidebarCollapsed": collapsed })).into_response()
}

async fn handle_dismiss_instructions(State(state): State<AppState>) -> StatusCode {
    state.engine.write().await.dismiss_instructions();
    StatusCode::NO_CONTENT
}

async fn handle_refresh(State(state): State<AppState>) -> Response {
    if refresh(&state).await {
        return StatusCode::NO_CONTENT.into_response();
    }

    let message = state
        .engine
        .read()
        .await
        .last_error()
        .unwrap_or("Failed to refresh schedule")
        .to_string();
    (StatusCode::BAD_GATEWAY, message).into_response()
}
