//! Authentication service — login and logout orchestration.

use chrono::{Duration, Utc};
use sealguard_core::error::{SealguardError, SealguardResult};
use sealguard_core::models::auth_token::CreateAuthToken;
use sealguard_core::models::user::User;
use sealguard_core::repository::{AuthTokenRepository, UserRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT bearer token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// The authenticated user.
    pub user: User,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, T: AuthTokenRepository> {
    user_repo: U,
    token_repo: T,
    config: AuthConfig,
}

impl<U: UserRepository, T: AuthTokenRepository> AuthService<U, T> {
    pub fn new(user_repo: U, token_repo: T, config: AuthConfig) -> Self {
        Self {
            user_repo,
            token_repo,
            config,
        }
    }

    /// Authenticate a user with username + password and issue a
    /// bearer token, recording its hash in the token ledger.
    pub async fn login(&self, input: LoginInput) -> SealguardResult<LoginOutput> {
        // 1. Look up user. An unknown username is reported exactly
        //    like a bad password.
        let user = match self.user_repo.get_by_username(&input.username).await {
            Ok(u) => u,
            Err(SealguardError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        // 2. Check account status.
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        // 3. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;

        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 4. Record the login time.
        self.user_repo.record_login(user.id, Utc::now()).await?;

        // 5. Issue JWT and record its hash in the ledger.
        let access_token =
            token::issue_access_token(user.id, &user.username, user.role, &self.config)?;
        let expires_at =
            Utc::now() + Duration::seconds(self.config.access_token_lifetime_secs as i64);

        self.token_repo
            .create(CreateAuthToken {
                user_id: user.id,
                token_hash: token::hash_token(&access_token),
                expires_at,
            })
            .await?;

        Ok(LoginOutput {
            access_token,
            token_type: "Bearer",
            expires_in: self.config.access_token_lifetime_secs,
            user,
        })
    }

    /// Revoke the presented bearer token (logout).
    ///
    /// The JWT stays cryptographically valid until it expires; the
    /// ledger entry records that the user surrendered it.
    pub async fn logout(&self, user_id: Uuid, raw_token: &str) -> SealguardResult<()> {
        self.token_repo
            .revoke(user_id, &token::hash_token(raw_token))
            .await
    }

    /// Load the authenticated user's record.
    pub async fn current_user(&self, user_id: Uuid) -> SealguardResult<User> {
        self.user_repo.get_by_id(user_id).await
    }
}
