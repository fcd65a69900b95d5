// src/lib.rs

//! Librify: a library lending service.
//!
//! Catalog browsing, a per-user cart, the borrowing workflow (stock claims,
//! due dates, returns and fines), due-date notifications and a rule-based
//! assistant, served over HTTP and backed by either PostgreSQL or an
//! in-memory fixture store (demo mode).

pub mod assistant;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
