use crate::models::{Account, DataValidationError};
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Persistence for [`Account`] records.
///
/// Implementations assign identifiers on `create` and never reuse them.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new record and return it with its assigned id.
    async fn create(&self, account: &Account) -> Result<Account, AppError>;

    /// Overwrite name, email, address and phone number of an existing record.
    /// `date_joined` is left as stored.
    async fn update(&self, account: &Account) -> Result<Account, AppError>;

    /// Remove the record if present. Returns whether a record was removed.
    async fn delete(&self, id: i32) -> Result<bool, AppError>;

    async fn find(&self, id: i32) -> Result<Option<Account>, AppError>;

    /// Every record, in id order.
    async fn all(&self) -> Result<Vec<Account>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

pub(crate) fn require_id(account: &Account) -> Result<i32, DataValidationError> {
    account
        .id
        .ok_or_else(|| DataValidationError::new("update called with empty id field"))
}

#[derive(Default)]
struct MemoryState {
    last_id: i32,
    accounts: BTreeMap<i32, Account>,
}

/// Process-local store backed by an ordered map.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account, AppError> {
        let mut state = self.state.write().await;
        let id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("account id space exhausted")))?;
        state.last_id = id;

        let stored = Account {
            id: Some(id),
            ..account.clone()
        };
        state.accounts.insert(id, stored.clone());

        tracing::info!(account_id = id, "Account created");
        Ok(stored)
    }

    async fn update(&self, account: &Account) -> Result<Account, AppError> {
        let id = require_id(account)?;
        let mut state = self.state.write().await;
        let stored = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account with id '{}' was not found", id)))?;

        stored.name = account.name.clone();
        stored.email = account.email.clone();
        stored.address = account.address.clone();
        stored.phone_number = account.phone_number.clone();

        Ok(stored.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let removed = self.state.write().await.accounts.remove(&id).is_some();
        if removed {
            tracing::info!(account_id = id, "Account deleted");
        }
        Ok(removed)
    }

    async fn find(&self, id: i32) -> Result<Option<Account>, AppError> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
