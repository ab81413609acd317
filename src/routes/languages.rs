use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_languages))
}

async fn list_languages(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let languages = state.store().list_languages()?;
    Ok(ok(languages))
}
