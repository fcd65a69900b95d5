// src/web/handlers/borrowing_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::borrowing::{self, ReturnRequest};
use crate::state::AppState;
use crate::store::BorrowingFilter;
use crate::web::extractor::SessionUser;

#[derive(Deserialize, Debug)]
pub struct ListBorrowingsQuery {
  /// Filter on the returned flag; omitted means the full history.
  pub returned: Option<bool>,
}

#[instrument(name = "handler::borrow_book", skip(app_state, path, session), fields(book_id = %path.as_ref()))]
pub async fn borrow_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let outcome = borrowing::borrow_book(&app_state.backend, session.0, path.into_inner()).await?;

  Ok(HttpResponse::Created().json(json!({
      "message": outcome.message,
      "borrowing": outcome.borrowing
  })))
}

#[instrument(name = "handler::return_book", skip(app_state, path, payload, session), fields(borrowing_id = %path.as_ref()))]
pub async fn return_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: Option<web::Json<ReturnRequest>>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let request = payload.map(|p| p.into_inner()).unwrap_or_default();
  let outcome = borrowing::return_book(&app_state.backend, session.0, path.into_inner(), request).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": outcome.message,
      "borrowing": outcome.borrowing
  })))
}

#[instrument(name = "handler::list_borrowings", skip(app_state, query, session))]
pub async fn list_borrowings_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListBorrowingsQuery>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let user_id = session.0.ok_or(AppError::Unauthenticated)?;

  let borrowings = app_state
    .backend
    .borrowings()
    .find(BorrowingFilter {
      user_id: Some(user_id),
      book_id: None,
      is_returned: query.returned,
    })
    .await?;

  Ok(HttpResponse::Ok().json(json!({ "borrowings": borrowings })))
}
