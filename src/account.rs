//! User accounts: the stored model plus the register and log-in handlers.
//!
//! Credentials are stored and compared as plaintext, matching the system
//! this replaces. Hardening auth is explicitly out of scope.

use std::collections::BTreeSet;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error};

/// A user account as stored in `users.json`, keyed there by username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The account password, stored in plaintext.
    pub password: String,

    /// When the account was registered.
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// The achievement IDs this user has unlocked.
    ///
    /// Absent in files written by older versions, which defaults to empty.
    #[serde(default)]
    pub achievements: BTreeSet<String>,
}

impl Account {
    /// Create an account registered now with no unlocked achievements.
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_owned(),
            created_at: OffsetDateTime::now_utc(),
            achievements: BTreeSet::new(),
        }
    }
}

/// A username/password pair from a register or log-in request.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The username.
    #[serde(default)]
    pub username: String,
    /// The password.
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Trim both fields, rejecting empty values.
    fn cleaned(&self) -> Result<(&str, &str), Error> {
        let username = self.username.trim();
        let password = self.password.trim();

        if username.is_empty() || password.is_empty() {
            return Err(Error::MissingCredentials);
        }

        Ok((username, password))
    }
}

/// The response body for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// A human-readable confirmation.
    pub message: &'static str,
}

/// Register a new user account.
pub async fn post_register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    let (username, password) = credentials.cleaned()?;

    let mut store = state.store.lock().map_err(|_| Error::StoreLockError)?;
    store.create_user(username, password)?;

    tracing::info!("Registered user {username}");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
        }),
    ))
}

/// The response body for a successful log-in.
#[derive(Debug, Serialize)]
pub struct LogInResponse {
    /// A human-readable confirmation.
    pub message: &'static str,
    /// The logged-in username, echoed back for the client to keep.
    pub username: String,
}

/// Log a user in by comparing credentials.
pub async fn post_log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LogInResponse>, Error> {
    let (username, password) = credentials.cleaned()?;

    let store = state.store.lock().map_err(|_| Error::StoreLockError)?;
    store.verify_credentials(username, password)?;

    Ok(Json(LogInResponse {
        message: "Login successful",
        username: username.to_owned(),
    }))
}
