// src/web/handlers/assistant_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ChatRequestPayload {
  pub message: String,
}

#[instrument(name = "handler::assistant_chat", skip(app_state, payload))]
pub async fn chat_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ChatRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let reply = app_state.assistant.respond(&payload.message).await;
  Ok(HttpResponse::Ok().json(json!({ "reply": reply })))
}
