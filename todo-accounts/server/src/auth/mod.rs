//! Password login and token authorization for account-scoped routes.

use std::sync::{Arc, OnceLock};

use crate::store::{AccountStore, StoreError};

pub mod api;
pub mod password;
pub mod token;

pub use password::{HashError, PasswordHasher};
pub use token::{Claims, TokenError, TokenService};

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown account or wrong password. Callers cannot tell the two apart.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The request carried no token, or an empty one.
    #[error("missing token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(TokenError),
    /// A token could not be produced after a successful login.
    #[error("token issuance failed: {0}")]
    TokenIssue(TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("password verification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashed once into the stand-in hash checked for unknown accounts.
const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

/// Proves possession of an account's password.
///
/// Shared by login and by account deletion, which re-checks the password on
/// top of the token. Unknown accounts are checked against a stand-in hash of
/// the same cost before being rejected.
#[derive(Clone)]
pub struct CredentialVerifier {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<PasswordHasher>,
    dummy_hash: Arc<OnceLock<Option<String>>>,
}

impl CredentialVerifier {
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: Arc<PasswordHasher>) -> Self {
        Self {
            accounts,
            hasher,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Verifies `password` against the stored hash of `account_id`.
    #[tracing::instrument(skip(self, password))]
    pub async fn verify(&self, account_id: i64, password: &str) -> Result<(), AuthError> {
        let stored = match self.accounts.get_password_hash(account_id).await {
            Ok(hash) => Some(hash),
            Err(StoreError::AccountNotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };
        let known = stored.is_some();

        let hasher = self.hasher.clone();
        let dummy_hash = self.dummy_hash.clone();
        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => hasher.verify(&hash, &password),
            None => {
                let dummy = dummy_hash.get_or_init(|| hasher.hash(DUMMY_PASSWORD).ok());
                if let Some(dummy) = dummy {
                    let _ = hasher.verify(dummy, &password);
                }
                false
            }
        })
        .await?;

        if verified {
            Ok(())
        } else if known {
            tracing::info!("Password mismatch for account {}", account_id);
            Err(AuthError::InvalidCredentials)
        } else {
            tracing::info!("Credential check for unknown account {}", account_id);
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Orchestrates login and per-request authorization.
#[derive(Clone)]
pub struct AuthFlow {
    credentials: CredentialVerifier,
    tokens: TokenService,
}

impl AuthFlow {
    pub fn new(credentials: CredentialVerifier, tokens: TokenService) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    /// Checks the password of `account_id` and issues a token for it.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, account_id: i64, password: &str) -> Result<String, AuthError> {
        self.credentials.verify(account_id, password).await?;
        self.tokens
            .issue(&account_id.to_string())
            .map_err(AuthError::TokenIssue)
    }

    /// Checks that `token` was issued for `target_id` and is still valid.
    ///
    /// An absent or empty token is rejected before any signature work.
    #[tracing::instrument(skip(self, token))]
    pub async fn authorize(&self, token: Option<&str>, target_id: i64) -> Result<Claims, AuthError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::MissingToken),
        };
        self.tokens
            .validate(token, &target_id.to_string())
            .map_err(|err| {
                tracing::info!("Rejected token for account {}: {}", target_id, err);
                AuthError::InvalidToken(err)
            })
    }

    /// Requires both a valid token for `target_id` and its password.
    #[tracing::instrument(skip(self, token, password))]
    pub async fn authorize_with_password(
        &self,
        token: Option<&str>,
        target_id: i64,
        password: &str,
    ) -> Result<(), AuthError> {
        self.authorize(token, target_id).await?;
        self.credentials.verify(target_id, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockAccountStore;
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    const SECRET: &[u8] = b"test_secret";

    fn hasher() -> Arc<PasswordHasher> {
        Arc::new(PasswordHasher::new(1024, 1))
    }

    fn tokens() -> TokenService {
        TokenService::new(SECRET, Duration::seconds(60))
    }

    fn flow_with_account(id: i64, password: &str) -> AuthFlow {
        let hasher = hasher();
        let hash = hasher.hash(password).unwrap();
        let mut store = MockAccountStore::new();
        store
            .expect_get_password_hash()
            .returning(move |requested| {
                if requested == id {
                    Ok(hash.clone())
                } else {
                    Err(StoreError::AccountNotFound(requested))
                }
            });
        AuthFlow::new(CredentialVerifier::new(Arc::new(store), hasher), tokens())
    }

    #[tokio::test]
    async fn login_issues_token_for_account() {
        let flow = flow_with_account(7, "pw123456");

        let token = flow.login(7, "pw123456").await.unwrap();

        let claims = tokens().validate(&token, "7").unwrap();
        assert_eq!(claims.sub, "7");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let flow = flow_with_account(7, "pw123456");

        let result = flow.login(7, "wrong").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_hides_unknown_account() {
        let flow = flow_with_account(7, "pw123456");

        let result = flow.login(8, "pw123456").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_account_still_runs_password_verification() {
        let mut store = MockAccountStore::new();
        store
            .expect_get_password_hash()
            .returning(|id| Err(StoreError::AccountNotFound(id)));
        let verifier = CredentialVerifier::new(Arc::new(store), hasher());

        let result = verifier.verify(8, "pw123456").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        let dummy = verifier.dummy_hash.get().cloned().flatten().unwrap();
        assert!(dummy.starts_with("$argon2id$"));
        assert!(!hasher().verify(&dummy, "pw123456"));
    }

    #[tokio::test]
    async fn login_propagates_store_failure() {
        let mut store = MockAccountStore::new();
        store
            .expect_get_password_hash()
            .with(eq(7))
            .returning(|_| Err(StoreError::Database(sea_orm::DbErr::Custom("down".into()))));
        let flow = AuthFlow::new(CredentialVerifier::new(Arc::new(store), hasher()), tokens());

        let result = flow.login(7, "pw123456").await;

        assert!(matches!(result, Err(AuthError::Store(_))));
    }

    #[tokio::test]
    async fn authorize_rejects_missing_token_without_store_access() {
        let store = MockAccountStore::new();
        let flow = AuthFlow::new(CredentialVerifier::new(Arc::new(store), hasher()), tokens());

        assert!(matches!(flow.authorize(None, 7).await, Err(AuthError::MissingToken)));
        assert!(matches!(flow.authorize(Some(""), 7).await, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn authorize_checks_subject_and_expiry() {
        let flow = flow_with_account(7, "pw123456");
        let token = tokens().issue("7").unwrap();
        let stale = tokens()
            .issue_at("7", Utc::now() - Duration::hours(1))
            .unwrap();

        assert!(flow.authorize(Some(&token), 7).await.is_ok());
        assert!(matches!(
            flow.authorize(Some(&token), 8).await,
            Err(AuthError::InvalidToken(TokenError::SubjectMismatch))
        ));
        assert!(matches!(
            flow.authorize(Some(&stale), 7).await,
            Err(AuthError::InvalidToken(TokenError::Expired))
        ));
    }

    #[tokio::test]
    async fn destructive_authorization_requires_token_and_password() {
        let flow = flow_with_account(7, "pw123456");
        let token = tokens().issue("7").unwrap();

        assert!(
            flow.authorize_with_password(Some(&token), 7, "pw123456")
                .await
                .is_ok()
        );
        assert!(matches!(
            flow.authorize_with_password(Some(&token), 7, "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            flow.authorize_with_password(None, 7, "pw123456").await,
            Err(AuthError::MissingToken)
        ));
    }
}
