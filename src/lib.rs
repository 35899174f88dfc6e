//! Fintrack is a web app for tracking personal income and expenses.
//!
//! This library provides a JSON REST API for registering users, recording
//! transactions, and computing a dashboard of aggregated balances, budget
//! status, monthly trends, streaks, and achievements. The aggregation itself
//! is a set of pure functions over an in-memory transaction list; storage,
//! auth, and transport are thin adapters around it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod achievement;
mod app_state;
mod budget;
mod dashboard;
mod endpoints;
mod event;
mod filters;
mod logging;
mod metrics;
mod routing;
mod store;
mod streak;
mod transaction;
mod trends;

pub use account::Account;
pub use achievement::AchievementDetails;
pub use app_state::AppState;
pub use budget::DEFAULT_MONTHLY_BUDGET;
pub use dashboard::DashboardViewModel;
pub use event::DomainEvent;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use store::FlatFileStore;
pub use transaction::{Transaction, TransactionKind};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not include a username or password, or included an
    /// empty one.
    #[error("username and password are required")]
    MissingCredentials,

    /// The username/password pair did not match a registered user.
    ///
    /// Deliberately does not distinguish "unknown user" from "wrong password"
    /// so the log-in endpoint does not leak which usernames exist.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Tried to register a username that is already taken.
    #[error("username already exists")]
    DuplicateUsername,

    /// The username in the request does not match a registered user.
    #[error("user not found")]
    UserNotFound,

    /// The transaction type was neither "income" nor "expense".
    #[error("type must be 'income' or 'expense'")]
    InvalidTransactionType,

    /// The transaction amount could not be read as a finite number.
    #[error("amount must be a number")]
    InvalidAmount,

    /// The transaction ID did not match any of the user's transactions.
    #[error("transaction not found")]
    TransactionNotFound,

    /// Reading or writing one of the flat data files failed.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("could not access the data file: {0}")]
    StoreIo(String),

    /// A value could not be serialized to or deserialized from JSON.
    #[error("could not serialize as JSON: {0}")]
    JsonError(String),

    /// Could not acquire the store lock.
    #[error("could not acquire the store lock")]
    StoreLockError,
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::StoreIo(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JsonError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::MissingCredentials
            | Error::DuplicateUsername
            | Error::InvalidTransactionType
            | Error::InvalidAmount => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::UserNotFound | Error::TransactionNotFound => StatusCode::NOT_FOUND,
            // Internal errors are not intended to be shown to the client.
            ref error => {
                tracing::error!("An unexpected error occurred: {}", error);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
