// src/web/extractor.rs

use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The current session's user, if any. Extraction itself never fails; the
/// services answer `Unauthenticated` where a session is required, matching
/// the "redirect to sign-in" behavior of the UI.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub Option<Uuid>);

/// Bearer token from the Authorization header, or `None`.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(actix_web::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

impl FromRequest for SessionUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let user = req
      .app_data::<web::Data<AppState>>()
      .and_then(|state| bearer_token(req).and_then(|token| state.sessions.resolve(token)));

    if user.is_none() && bearer_token(req).is_some() {
      warn!("SessionUser extractor: token present but no matching session.");
    }
    ready(Ok(SessionUser(user)))
  }
}
