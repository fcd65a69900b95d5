// src/state.rs

use crate::assistant::Assistant;
use crate::config::AppConfig;
use crate::services::auth::Sessions;
use crate::store::Backend;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub backend: Backend,
  pub sessions: Arc<Sessions>,
  pub assistant: Arc<Assistant>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(backend: Backend, config: Arc<AppConfig>) -> Self {
    let assistant = Arc::new(Assistant::new(&backend));
    Self {
      backend,
      sessions: Arc::new(Sessions::new()),
      assistant,
      config,
    }
  }
}
