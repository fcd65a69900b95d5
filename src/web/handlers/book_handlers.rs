// src/web/handlers/book_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::borrowing;
use crate::state::AppState;
use crate::web::extractor::SessionUser;

#[derive(Deserialize, Debug)]
pub struct ListBooksQuery {
  pub category: Option<String>,
  pub search: Option<String>,
}

#[instrument(name = "handler::list_books", skip(app_state, query))]
pub async fn list_books_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListBooksQuery>,
) -> Result<HttpResponse, AppError> {
  let mut books = app_state.backend.books().find_all().await?;

  if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty() && *c != "Semua") {
    books.retain(|book| book.category == category);
  }
  if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
    let needle = search.to_lowercase();
    books.retain(|book| {
      book.title.to_lowercase().contains(&needle) || book.author.to_lowercase().contains(&needle)
    });
  }

  info!("Successfully fetched {} books.", books.len());
  Ok(HttpResponse::Ok().json(json!({
      "message": "Daftar buku berhasil diambil.",
      "books": books
  })))
}

#[instrument(name = "handler::get_book", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn get_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let book_id = path.into_inner();

  let book = app_state
    .backend
    .books()
    .find_by_id(book_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Buku tidak ditemukan".to_string()))?;

  Ok(HttpResponse::Ok().json(json!({ "book": book })))
}

/// Advisory flag for the "already borrowed" button state on the detail page.
#[instrument(name = "handler::active_borrowing", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn active_borrowing_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  session: SessionUser,
) -> Result<HttpResponse, AppError> {
  let book_id = path.into_inner();
  let user_id = session.0.ok_or(AppError::Unauthenticated)?;

  let active = borrowing::check_active_borrowing(&app_state.backend, user_id, book_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "active": active })))
}
