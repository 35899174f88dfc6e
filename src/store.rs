//! Flat-file JSON persistence for accounts and transactions.
//!
//! Two files live in the data directory: `users.json`, a map from username
//! to account, and `transactions.json`, a map from username to transaction
//! array. Both are pretty-printed, loaded once at startup, and rewritten in
//! full after every mutation. There is no file locking; the server assumes
//! it is the only writer.

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    Error,
    account::Account,
    transaction::{Transaction, TransactionKind},
};

/// The file holding user credentials and unlocked achievements.
const USERS_FILE: &str = "users.json";

/// The file holding each user's transactions.
const TRANSACTIONS_FILE: &str = "transactions.json";

/// The username that transactions from a legacy bare-array data file are
/// filed under.
const LEGACY_USER: &str = "_legacy";

/// A store that persists accounts and transactions as flat JSON files.
#[derive(Debug)]
pub struct FlatFileStore {
    data_dir: PathBuf,
    users: HashMap<String, Account>,
    transactions: HashMap<String, Vec<Transaction>>,
}

impl FlatFileStore {
    /// Open the store in `data_dir`, loading any existing data files.
    ///
    /// Missing files start the store empty. A corrupt file is logged and
    /// treated as empty rather than refusing to start; the file is not
    /// rewritten until the first mutation. An older `transactions.json`
    /// containing a bare array instead of a per-user map is adopted under
    /// the `_legacy` username.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let data_dir = data_dir.into();

        let users = match read_data_file(&data_dir.join(USERS_FILE))? {
            Some(text) => match serde_json::from_str(&text) {
                Ok(users) => users,
                Err(error) => {
                    tracing::error!("Error reading {USERS_FILE}: {error}");
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };

        let transactions = match read_data_file(&data_dir.join(TRANSACTIONS_FILE))? {
            Some(text) => parse_transactions_file(&text),
            None => HashMap::new(),
        };

        Ok(Self {
            data_dir,
            users,
            transactions,
        })
    }

    /// Whether `username` belongs to a registered account.
    pub fn contains_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Register a new account.
    ///
    /// # Errors
    /// Returns [Error::DuplicateUsername] if the username is taken, or
    /// [Error::StoreIo] if the users file could not be written.
    pub fn create_user(&mut self, username: &str, password: &str) -> Result<&Account, Error> {
        if self.users.contains_key(username) {
            return Err(Error::DuplicateUsername);
        }

        self.users
            .insert(username.to_owned(), Account::new(password));
        self.save_users()?;

        Ok(&self.users[username])
    }

    /// Check a username/password pair against the stored credentials.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredentials] if the user is unknown or the
    /// password does not match.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<(), Error> {
        match self.users.get(username) {
            Some(account) if account.password == password => Ok(()),
            _ => Err(Error::InvalidCredentials),
        }
    }

    /// The achievement IDs the user has already unlocked.
    pub fn unlocked_achievements(&self, username: &str) -> BTreeSet<String> {
        self.users
            .get(username)
            .map(|account| account.achievements.clone())
            .unwrap_or_default()
    }

    /// Record newly unlocked achievement IDs for a user.
    ///
    /// IDs that are already recorded are kept as-is; an achievement is never
    /// recorded twice.
    pub fn record_achievements<'a, I>(&mut self, username: &str, ids: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let account = self.users.get_mut(username).ok_or(Error::UserNotFound)?;

        let mut changed = false;
        for id in ids {
            changed |= account.achievements.insert(id.to_owned());
        }

        if changed {
            self.save_users()?;
        }

        Ok(())
    }

    /// All transactions belonging to `username`, oldest first.
    ///
    /// Users with no transactions yet get an empty slice.
    pub fn transactions_for(&self, username: &str) -> &[Transaction] {
        self.transactions
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append a transaction to a user's history.
    pub fn add_transaction(
        &mut self,
        username: &str,
        transaction: Transaction,
    ) -> Result<(), Error> {
        self.transactions
            .entry(username.to_owned())
            .or_default()
            .push(transaction);

        self.save_transactions()
    }

    /// Apply a partial update to one of a user's transactions.
    ///
    /// Fields passed as `None` are left unchanged.
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if the ID does not match any of
    /// the user's transactions.
    pub fn update_transaction(
        &mut self,
        username: &str,
        transaction_id: &str,
        kind: Option<TransactionKind>,
        amount: Option<f64>,
        description: Option<String>,
    ) -> Result<Transaction, Error> {
        let transactions = self
            .transactions
            .get_mut(username)
            .ok_or(Error::TransactionNotFound)?;

        let transaction = transactions
            .iter_mut()
            .find(|transaction| transaction.id == transaction_id)
            .ok_or(Error::TransactionNotFound)?;

        if let Some(kind) = kind {
            transaction.kind = Some(kind);
        }
        if let Some(amount) = amount {
            transaction.amount = amount;
        }
        if let Some(description) = description {
            transaction.description = description;
        }

        let updated = transaction.clone();
        self.save_transactions()?;

        Ok(updated)
    }

    /// Remove one of a user's transactions and return it.
    ///
    /// # Errors
    /// Returns [Error::TransactionNotFound] if the ID does not match any of
    /// the user's transactions.
    pub fn delete_transaction(
        &mut self,
        username: &str,
        transaction_id: &str,
    ) -> Result<Transaction, Error> {
        let transactions = self
            .transactions
            .get_mut(username)
            .ok_or(Error::TransactionNotFound)?;

        let index = transactions
            .iter()
            .position(|transaction| transaction.id == transaction_id)
            .ok_or(Error::TransactionNotFound)?;

        let removed = transactions.remove(index);
        self.save_transactions()?;

        Ok(removed)
    }

    fn save_users(&self) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(&self.users)?;
        fs::write(self.data_dir.join(USERS_FILE), text)?;

        Ok(())
    }

    fn save_transactions(&self) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(&self.transactions)?;
        fs::write(self.data_dir.join(TRANSACTIONS_FILE), text)?;

        Ok(())
    }
}

/// Read a data file, mapping a missing file to `None`.
fn read_data_file(path: &Path) -> Result<Option<String>, Error> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Parse `transactions.json`, accepting both the per-user map and the legacy
/// bare-array layout.
fn parse_transactions_file(text: &str) -> HashMap<String, Vec<Transaction>> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) if value.is_array() => {
            match serde_json::from_value::<Vec<Transaction>>(value) {
                Ok(transactions) => HashMap::from([(LEGACY_USER.to_owned(), transactions)]),
                Err(error) => {
                    tracing::error!("Error reading {TRANSACTIONS_FILE}: {error}");
                    HashMap::new()
                }
            }
        }
        Ok(value) => match serde_json::from_value(value) {
            Ok(transactions) => transactions,
            Err(error) => {
                tracing::error!("Error reading {TRANSACTIONS_FILE}: {error}");
                HashMap::new()
            }
        },
        Err(error) => {
            tracing::error!("Error reading {TRANSACTIONS_FILE}: {error}");
            HashMap::new()
        }
    }
}
