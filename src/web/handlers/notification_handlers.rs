// src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::notifications::NotificationFeed;
use crate::state::AppState;
use crate::web::extractor::SessionUser;

#[instrument(name = "handler::list_notifications", skip(app_state, session))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let user_id = session.0.ok_or(AppError::Unauthenticated)?;

  // The feed (and its subscription) lives for this request only; dropping it
  // at the end of the handler is the unsubscribe.
  let feed = NotificationFeed::open(&app_state.backend, user_id).await?;
  let alerts = feed.current(Utc::now());

  Ok(HttpResponse::Ok().json(json!({ "alerts": alerts })))
}
