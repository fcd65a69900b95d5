// src/models/mod.rs

//! Data structures shared by the stores, services and the web layer.

pub mod book;
pub mod borrowing;
pub mod cart_item;
pub mod user;

pub use book::Book;
pub use borrowing::{due_status, late_fee_cents, Borrowing, DueStatus, LOAN_PERIOD_DAYS};
pub use cart_item::{CartItem, CartLine};
pub use user::User;
