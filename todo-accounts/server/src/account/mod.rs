use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::auth::{AuthError, AuthFlow, HashError, PasswordHasher};
use crate::store::{AccountStore, StoreError};

pub mod api;

#[derive(PartialEq, Clone, Eq, Hash)]
pub struct Account {
    id: i64,
    first_name: String,
    last_name: String,
    password_hash: String,
}

impl Account {
    pub fn new(id: i64, first_name: String, last_name: String, password_hash: String) -> Self {
        Self {
            id,
            first_name,
            last_name,
            password_hash,
        }
    }

    /// Returns the ID of the account.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Returns the stored Argon2 PHC string.
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Hands out account ids, strictly increasing from the highest persisted id.
///
/// Seeded once at startup; every allocation is a single atomic increment so
/// concurrent registrations never share an id. Ids of deleted accounts are
/// not reused.
#[derive(Debug, Default)]
pub struct AccountIdAllocator {
    last: AtomicI64,
}

impl AccountIdAllocator {
    pub fn new(last_id: i64) -> Self {
        Self {
            last: AtomicI64::new(last_id),
        }
    }

    /// Seeds the allocator with the current maximum id of `store`.
    #[tracing::instrument(skip(store))]
    pub async fn load(store: &dyn AccountStore) -> Result<Self, StoreError> {
        let last_id = store.max_account_id().await?.unwrap_or(0);
        tracing::info!("Account ids continue after {}", last_id);
        Ok(Self::new(last_id))
    }

    /// Reserves the next id.
    pub fn next_id(&self) -> i64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Error type for AccountService operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Registration, listing and deletion of accounts.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: Arc<PasswordHasher>,
    ids: Arc<AccountIdAllocator>,
    auth: Arc<AuthFlow>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: Arc<PasswordHasher>,
        ids: Arc<AccountIdAllocator>,
        auth: Arc<AuthFlow>,
    ) -> Self {
        Self {
            store,
            hasher,
            ids,
            auth,
        }
    }

    /// Creates an account with a freshly allocated id.
    ///
    /// # Arguments
    ///
    /// * `first_name` - The first name of the account holder.
    /// * `last_name` - The last name of the account holder.
    /// * `password` - The plaintext password; only its hash is kept.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Account` if successful, or an error otherwise.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(
        &self,
        first_name: String,
        last_name: String,
        password: String,
    ) -> Result<Account, AccountServiceError> {
        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let account = Account::new(self.ids.next_id(), first_name, last_name, password_hash);
        self.store.create_account(&account).await?;
        tracing::info!("Registered account {}", account.id());
        Ok(account)
    }

    /// Retrieves all accounts.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Account>, AccountServiceError> {
        Ok(self.store.list_accounts().await?)
    }

    /// Fails with [`StoreError::AccountNotFound`] unless the account exists.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_exists(&self, id: i64) -> Result<(), AccountServiceError> {
        self.store.get_password_hash(id).await?;
        Ok(())
    }

    /// Deletes an account and all of its todos.
    ///
    /// Requires a valid token for the account and its current password.
    #[tracing::instrument(skip(self, token, password))]
    pub async fn delete(
        &self,
        token: Option<&str>,
        id: i64,
        password: &str,
    ) -> Result<(), AccountServiceError> {
        self.auth
            .authorize_with_password(token, id, password)
            .await?;
        self.store.delete_account(id).await?;
        Ok(())
    }
}
