use axum::extract::State;
use axum::Json;
use tracing::Instrument;

use crate::error::AppError;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::orchestration::conversation::Conversation;
use crate::state::AppState;

pub async fn chat_completion(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(&state.default_model)
        .to_string();
    let span = tracing::info_span!("chat", request_id = %uuid::Uuid::new_v4(), model = %model);

    async move {
        let conversation = build_conversation(&request)?;
        tracing::info!(
            turns = conversation.messages().len(),
            functions = request.enable_functions,
            "chat completion request received"
        );

        let outcome = state
            .orchestrator
            .complete(conversation, &model, request.enable_functions)
            .await?;

        let has_function_calls = !outcome.tool_calls.is_empty();
        Ok::<_, AppError>(Json(ChatResponse {
            response: outcome.text,
            function_calls: has_function_calls.then_some(outcome.tool_calls),
            has_function_calls,
            usage: outcome.usage,
            model: outcome.model,
        }))
    }
    .instrument(span)
    .await
}

fn build_conversation(request: &ChatRequest) -> Result<Conversation, AppError> {
    match request.messages.as_ref().filter(|m| !m.is_empty()) {
        Some(history) => Conversation::from_history(history.clone()),
        None => {
            if request.message.trim().is_empty() {
                return Err(AppError::InvalidConversation("message is empty".to_string()));
            }
            Ok(Conversation::new(&request.context, &request.message))
        }
    }
}
