//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its lenient JSON decoding
//! - Request handlers for listing, creating, updating, and deleting
//!   transactions
//!
//! Decoding is deliberately forgiving: the aggregation engine never raises
//! errors for malformed records, it degrades instead. A non-numeric amount
//! becomes zero, an unrecognised type becomes `None` (excluded from income
//! and expense sums), and an unparseable timestamp becomes `None` (excluded
//! from streak and trend calculations). Strict validation only happens at
//! the create endpoint, where bad input is still a client error.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Deserializer, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{AppState, Error};

/// Whether a transaction brings money in or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// Parse a kind from user input, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything other than "income" or "expense".
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    /// The lowercase wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// An income or expense record owned by a user account.
///
/// Matches the wire and storage shape
/// `{id, type, amount, description, category, createdAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, a UUID assigned by the server.
    pub id: String,

    /// Whether this is income or an expense.
    ///
    /// `None` means the stored record had a missing or unrecognised type.
    /// Such transactions count toward the transaction total but are excluded
    /// from income and expense sums.
    #[serde(rename = "type", default, deserialize_with = "deserialize_kind")]
    pub kind: Option<TransactionKind>,

    /// The amount of money earned or spent. Missing or non-numeric amounts
    /// decode as zero.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,

    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,

    /// A free-form category label, e.g. "groceries".
    #[serde(default)]
    pub category: String,

    /// When the transaction was recorded, as an RFC 3339 timestamp.
    ///
    /// `None` means the stored record had a missing or unparseable timestamp.
    /// Such transactions are excluded from streak and trend calculations.
    #[serde(
        rename = "createdAt",
        default,
        serialize_with = "time::serde::rfc3339::option::serialize",
        deserialize_with = "deserialize_created_at"
    )]
    pub created_at: Option<OffsetDateTime>,
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<TransactionKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    Ok(value.as_str().and_then(TransactionKind::parse))
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    Ok(value.as_f64().filter(|amount| amount.is_finite()).unwrap_or(0.0))
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    Ok(value
        .as_str()
        .and_then(|text| OffsetDateTime::parse(text, &Rfc3339).ok()))
}

/// Query parameters identifying whose transactions to operate on.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// The username that owns the transactions.
    pub user: String,
}

/// List all transactions belonging to a user.
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let username = query.user.trim().to_owned();
    if username.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let store = state.store.lock().map_err(|_| Error::StoreLockError)?;
    if !store.contains_user(&username) {
        return Err(Error::UserNotFound);
    }

    Ok(Json(store.transactions_for(&username).to_vec()))
}

/// The request body for creating a transaction.
///
/// `amount` is kept as raw JSON so that both numbers and numeric strings are
/// accepted, matching what loose HTML form clients send.
#[derive(Debug, Deserialize)]
pub struct NewTransaction {
    /// The username that will own the transaction.
    pub username: String,
    /// The transaction type, "income" or "expense".
    #[serde(rename = "type", default)]
    pub kind: String,
    /// The transaction amount.
    #[serde(default)]
    pub amount: serde_json::Value,
    /// A text description of the transaction.
    #[serde(default)]
    pub description: String,
    /// A free-form category label.
    #[serde(default)]
    pub category: String,
}

/// Coerce a raw JSON amount to a finite number, accepting numeric strings.
fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(number) => number.as_f64()?,
        serde_json::Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };

    amount.is_finite().then_some(amount)
}

/// Create a new transaction for a user.
///
/// The server assigns the transaction ID and the `createdAt` timestamp.
pub async fn post_transaction(
    State(state): State<AppState>,
    Json(request): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let username = request.username.trim().to_owned();
    if username.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let kind = TransactionKind::parse(&request.kind).ok_or(Error::InvalidTransactionType)?;
    let amount = parse_amount(&request.amount).ok_or(Error::InvalidAmount)?;

    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        kind: Some(kind),
        amount,
        description: request.description,
        category: request.category,
        created_at: Some(OffsetDateTime::now_utc()),
    };

    let mut store = state.store.lock().map_err(|_| Error::StoreLockError)?;
    if !store.contains_user(&username) {
        return Err(Error::UserNotFound);
    }
    store.add_transaction(&username, transaction.clone())?;

    tracing::info!("Created transaction {} for user {username}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// The request body for updating a transaction.
///
/// All fields besides `username` are optional; absent fields are left
/// unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateTransaction {
    /// The username that owns the transaction.
    pub username: String,
    /// A new transaction type, if changing it.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// A new amount, if changing it.
    pub amount: Option<serde_json::Value>,
    /// A new description, if changing it.
    pub description: Option<String>,
}

/// Update fields of an existing transaction.
pub async fn put_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    Json(request): Json<UpdateTransaction>,
) -> Result<Json<Transaction>, Error> {
    let username = request.username.trim().to_owned();
    if username.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let kind = match &request.kind {
        Some(text) => Some(TransactionKind::parse(text).ok_or(Error::InvalidTransactionType)?),
        None => None,
    };
    let amount = match &request.amount {
        Some(value) => Some(parse_amount(value).ok_or(Error::InvalidAmount)?),
        None => None,
    };

    let mut store = state.store.lock().map_err(|_| Error::StoreLockError)?;
    if !store.contains_user(&username) {
        return Err(Error::UserNotFound);
    }

    let updated =
        store.update_transaction(&username, &transaction_id, kind, amount, request.description)?;

    Ok(Json(updated))
}

/// The response body for a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always true; kept for wire compatibility with older clients.
    pub success: bool,
    /// The transaction that was removed.
    pub removed: Transaction,
}

/// Delete a transaction by ID.
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DeleteResponse>, Error> {
    let username = query.user.trim().to_owned();
    if username.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let mut store = state.store.lock().map_err(|_| Error::StoreLockError)?;
    if !store.contains_user(&username) {
        return Err(Error::UserNotFound);
    }

    let removed = store.delete_transaction(&username, &transaction_id)?;

    Ok(Json(DeleteResponse {
        success: true,
        removed,
    }))
}
