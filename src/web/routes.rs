// src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// This function is called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Authentication Routes
      .service(
        web::scope("/auth")
          .route(
            "/signup",
            web::post().to(crate::web::handlers::auth_handlers::signup_handler),
          )
          .route(
            "/signin",
            web::post().to(crate::web::handlers::auth_handlers::signin_handler),
          )
          .route(
            "/signout",
            web::post().to(crate::web::handlers::auth_handlers::signout_handler),
          )
          .route(
            "/password-reset",
            web::post().to(crate::web::handlers::auth_handlers::password_reset_handler),
          ),
      )
      // Catalog Routes
      .service(
        web::scope("/books")
          .route("", web::get().to(crate::web::handlers::book_handlers::list_books_handler))
          .route(
            "/{book_id}",
            web::get().to(crate::web::handlers::book_handlers::get_book_handler),
          )
          .route(
            "/{book_id}/active-borrowing",
            web::get().to(crate::web::handlers::book_handlers::active_borrowing_handler),
          )
          .route(
            "/{book_id}/borrow",
            web::post().to(crate::web::handlers::borrowing_handlers::borrow_book_handler),
          ),
      )
      // Cart Routes
      .service(
        web::scope("/cart")
          .route("", web::get().to(crate::web::handlers::cart_handlers::list_cart_handler))
          .route(
            "/add",
            web::post().to(crate::web::handlers::cart_handlers::add_to_cart_handler),
          )
          .route(
            "/borrow",
            web::post().to(crate::web::handlers::cart_handlers::borrow_selected_handler),
          )
          .route(
            "/{book_id}",
            web::delete().to(crate::web::handlers::cart_handlers::remove_from_cart_handler),
          ),
      )
      // Borrowing history
      .service(
        web::scope("/borrowings")
          .route(
            "",
            web::get().to(crate::web::handlers::borrowing_handlers::list_borrowings_handler),
          )
          .route(
            "/{borrowing_id}/return",
            web::post().to(crate::web::handlers::borrowing_handlers::return_book_handler),
          ),
      )
      // Due-date notifications
      .service(web::scope("/notifications").route(
        "",
        web::get().to(crate::web::handlers::notification_handlers::list_notifications_handler),
      ))
      // Assistant chat
      .service(web::scope("/assistant").route(
        "/chat",
        web::post().to(crate::web::handlers::assistant_handlers::chat_handler),
      )),
  );
}
