// src/services/auth.rs

//! Authentication: password hashing/verification and session management.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::User;
use crate::services::email;
use crate::store::subscription::{SubscriberSet, Subscription};
use crate::store::{Backend, NewUser};

const MIN_PASSWORD_LEN: usize = 6;

/// Active session tokens. Tokens are opaque uuid strings handed out at
/// sign-in and revoked at sign-out; resolution is synchronous so the request
/// extractor can use it without blocking.
pub struct Sessions {
  map: RwLock<HashMap<String, Uuid>>,
  subs: SubscriberSet<(), Vec<Uuid>>,
}

impl Sessions {
  pub fn new() -> Self {
    Self {
      map: RwLock::new(HashMap::new()),
      subs: SubscriberSet::new(),
    }
  }

  pub fn open(&self, user_id: Uuid) -> String {
    let token = Uuid::new_v4().to_string();
    self.map.write().insert(token.clone(), user_id);
    self.publish();
    token
  }

  pub fn close(&self, token: &str) {
    if self.map.write().remove(token).is_some() {
      self.publish();
    }
  }

  pub fn resolve(&self, token: &str) -> Option<Uuid> {
    self.map.read().get(token).copied()
  }

  pub fn signed_in_users(&self) -> Vec<Uuid> {
    let mut users: Vec<Uuid> = self.map.read().values().copied().collect();
    users.sort();
    users.dedup();
    users
  }

  /// Auth-state changes as a live view: the set of signed-in users,
  /// re-delivered on every sign-in/sign-out.
  pub fn subscribe(&self) -> Subscription<Vec<Uuid>> {
    self.subs.subscribe((), self.signed_in_users())
  }

  fn publish(&self) {
    self.subs.push(&(), self.signed_in_users());
  }
}

impl Default for Sessions {
  fn default() -> Self {
    Self::new()
  }
}

/// An opened session returned by sign-up and sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
  pub token: String,
  pub user: User,
}

/// Hashes a plain-text password using Argon2 with a fresh random salt.
#[instrument(name = "auth::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password tidak boleh kosong".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  let argon2_hasher = Argon2::default();

  match argon2_hasher.hash_password(password.as_bytes(), &salt) {
    Ok(password_hash) => Ok(password_hash.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash. `Ok(false)`
/// means the password simply does not match; other failures are internal.
#[instrument(name = "auth::verify_password", skip_all, err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool> {
  if hashed_password_str.is_empty() || provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(hashed_password_str).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("Alamat email tidak valid".to_string()));
  }
  if password.len() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation("Password minimal 6 karakter".to_string()));
  }
  Ok(())
}

/// Creates an account, sends the welcome email and opens a session.
#[instrument(name = "auth::sign_up", skip(backend, sessions, password))]
pub async fn sign_up(
  backend: &Backend,
  sessions: &Sessions,
  email: &str,
  password: &str,
  display_name: Option<String>,
) -> Result<SessionInfo> {
  validate_credentials(email, password)?;

  let user = backend
    .users()
    .create(NewUser {
      email: email.to_string(),
      password_hash: hash_password(password)?,
      display_name,
    })
    .await?;

  // A failed welcome email must not undo the registration.
  if let Err(e) = email::send_email(&user.email, "Selamat datang di Librify", WELCOME_BODY).await {
    tracing::warn!(error = %e, "Welcome email could not be sent");
  }

  let token = sessions.open(user.id);
  info!(user_id = %user.id, "New account registered.");
  Ok(SessionInfo { token, user })
}

/// Verifies credentials and issues a session token.
#[instrument(name = "auth::sign_in", skip(backend, sessions, password))]
pub async fn sign_in(backend: &Backend, sessions: &Sessions, email: &str, password: &str) -> Result<SessionInfo> {
  let user = backend.users().find_by_email(email).await?;
  let user = match user {
    Some(user) if verify_password(&user.password_hash, password)? => user,
    _ => {
      debug!("Sign-in rejected: unknown email or wrong password.");
      return Err(AppError::Unauthenticated);
    }
  };

  let token = sessions.open(user.id);
  info!(user_id = %user.id, "User signed in.");
  Ok(SessionInfo { token, user })
}

/// Revokes a session token. Unknown tokens are ignored.
pub fn sign_out(sessions: &Sessions, token: &str) {
  sessions.close(token);
}

/// Stores a reset token and mails it. Unknown addresses succeed silently so
/// the endpoint cannot be used to probe for accounts.
#[instrument(name = "auth::request_password_reset", skip(backend))]
pub async fn request_password_reset(backend: &Backend, email_addr: &str) -> Result<()> {
  let Some(user) = backend.users().find_by_email(email_addr).await? else {
    debug!("Password reset requested for unknown email.");
    return Ok(());
  };

  let token = Uuid::new_v4().to_string();
  backend.users().store_password_reset(user.id, &token).await?;

  let body = format!("Token untuk mengatur ulang password Anda: {}", token);
  if let Err(e) = email::send_email(&user.email, "Atur ulang password Librify", &body).await {
    tracing::warn!(error = %e, "Password reset email could not be sent");
  }
  Ok(())
}

const WELCOME_BODY: &str = "Akun Anda sudah aktif. Selamat membaca!";

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hashed_password_verifies_and_rejects() {
    let hash = hash_password("rahasia-123").unwrap();
    assert!(verify_password(&hash, "rahasia-123").unwrap());
    assert!(!verify_password(&hash, "salah").unwrap());
  }

  #[test]
  fn empty_password_cannot_be_hashed() {
    assert!(hash_password("").is_err());
  }

  #[tokio::test]
  async fn sessions_resolve_and_revoke() {
    let sessions = Sessions::new();
    let user_id = Uuid::new_v4();
    let token = sessions.open(user_id);

    assert_eq!(sessions.resolve(&token), Some(user_id));
    sessions.close(&token);
    assert_eq!(sessions.resolve(&token), None);
  }

  #[tokio::test]
  async fn auth_state_subscription_sees_sign_in_and_out() {
    let sessions = Sessions::new();
    let mut sub = sessions.subscribe();
    assert!(sub.snapshot().is_empty());

    let user_id = Uuid::new_v4();
    let token = sessions.open(user_id);
    assert_eq!(sub.changed().await, Some(vec![user_id]));

    sessions.close(&token);
    assert_eq!(sub.changed().await, Some(vec![]));
  }
}
