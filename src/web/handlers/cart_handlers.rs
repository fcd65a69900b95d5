// src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::{borrowing, cart};
use crate::state::AppState;
use crate::web::extractor::SessionUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequestPayload {
  pub book_id: Uuid,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BorrowSelectedRequestPayload {
  pub book_ids: Vec<Uuid>,
}

#[instrument(name = "handler::list_cart", skip(app_state, session))]
pub async fn list_cart_handler(app_state: web::Data<AppState>, session: SessionUser) -> Result<HttpResponse, AppError> {
  let lines = cart::list_cart(&app_state.backend, session.0).await?;
  Ok(HttpResponse::Ok().json(json!({ "items": lines })))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, payload, session),
    fields(book_id = %payload.book_id)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AddToCartRequestPayload>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let outcome = cart::add_to_cart(&app_state.backend, session.0, payload.book_id).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": outcome.message,
      "cartItem": outcome.item
  })))
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, path, session), fields(book_id = %path.as_ref()))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  cart::remove_from_cart(&app_state.backend, session.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Buku dihapus dari keranjang." })))
}

#[instrument(name = "handler::borrow_selected", skip(app_state, payload, session), fields(selected = payload.book_ids.len()))]
pub async fn borrow_selected_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<BorrowSelectedRequestPayload>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let selected: HashSet<Uuid> = payload.book_ids.iter().copied().collect();
  let outcome = borrowing::borrow_selected(&app_state.backend, session.0, &selected).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": outcome.message,
      "borrowed": outcome.borrowed,
      "skipped": outcome.skipped
  })))
}
