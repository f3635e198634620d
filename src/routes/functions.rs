use axum::extract::State;
use axum::Json;

use crate::models::chat::FunctionsResponse;
use crate::state::AppState;

pub async fn list_functions(State(state): State<AppState>) -> Json<FunctionsResponse> {
    tracing::debug!("available functions requested");
    Json(FunctionsResponse::from_definitions(
        state.orchestrator.tools().definitions(),
    ))
}
