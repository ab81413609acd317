use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Serialize;

use crate::extractors::JsonBody;
use crate::response::{accepted, AppError};
use crate::session::InboundEvent;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(receive_event))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventAccepted {
    user_id: i64,
}

/// Accepts a chat event and handles it in its own task; the reply reaches the
/// user through the notifier, not this response.
async fn receive_event(
    State(state): State<AppState>,
    JsonBody(event): JsonBody<InboundEvent>,
) -> Result<impl IntoResponse, AppError> {
    if event.user_id <= 0 {
        return Err(AppError::bad_request(
            "INVALID_USER_ID",
            "userId must be positive",
        ));
    }
    if event.text.trim().is_empty() && event.document_url.is_none() {
        return Err(AppError::bad_request(
            "EMPTY_EVENT",
            "Event needs text or a documentUrl",
        ));
    }

    let user_id = event.user_id;
    let controller = state.controller().clone();
    tokio::spawn(async move {
        if let Err(e) = controller.handle(event).await {
            tracing::error!(user_id, error = %e, "Event task failed");
        }
    });

    Ok(accepted(EventAccepted { user_id }))
}
