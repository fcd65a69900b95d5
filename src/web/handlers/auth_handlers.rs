// src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth;
use crate::state::AppState;
use crate::web::extractor::bearer_token;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub display_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct PasswordResetRequestPayload {
  pub email: String,
}

#[instrument(name = "handler::signup", skip(app_state, payload), fields(email = %payload.email))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let session = auth::sign_up(
    &app_state.backend,
    &app_state.sessions,
    &payload.email,
    &payload.password,
    payload.display_name.clone(),
  )
  .await?;

  Ok(HttpResponse::Created().json(json!({
      "message": "Pendaftaran berhasil.",
      "token": session.token,
      "user": session.user
  })))
}

#[instrument(name = "handler::signin", skip(app_state, payload), fields(email = %payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let session = auth::sign_in(&app_state.backend, &app_state.sessions, &payload.email, &payload.password).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "Login berhasil.",
      "token": session.token,
      "user": session.user
  })))
}

#[instrument(name = "handler::signout", skip_all)]
pub async fn signout_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  if let Some(token) = bearer_token(&req) {
    auth::sign_out(&app_state.sessions, token);
    info!("Session revoked.");
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Anda telah keluar." })))
}

#[instrument(name = "handler::password_reset", skip(app_state, payload), fields(email = %payload.email))]
pub async fn password_reset_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<PasswordResetRequestPayload>,
) -> Result<HttpResponse, AppError> {
  auth::request_password_reset(&app_state.backend, &payload.email).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Jika email terdaftar, tautan atur ulang password telah dikirim."
  })))
}
