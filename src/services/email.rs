// src/services/email.rs

use crate::errors::Result;
use tracing::info;

#[derive(Debug)]
pub struct SentEmailInfo {
  pub to: String,
  pub subject: String,
  pub message_id: String,
}

/// Mock delivery: logs the message and returns a synthetic id. Stands in for
/// a real provider in both demo and live mode.
pub async fn send_email(to: &str, subject: &str, body: &str) -> Result<SentEmailInfo> {
  info!("Simulating sending email: To='{}', Subject='{}'", to, subject);
  tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

  tracing::debug!(body_preview = %body.chars().take(50).collect::<String>(), "Email body");
  let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
  info!("Mock email sent successfully. Message ID: {}", message_id);

  Ok(SentEmailInfo {
    to: to.to_string(),
    subject: subject.to_string(),
    message_id,
  })
}
