use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    dto::{
        normalize_email, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
        UpdateRequest, UpdateResponse,
    },
    error::AuthError,
    jwt::JwtKeys,
    password::Hasher,
    repo::UserStore,
    repo_types::{display_name, NewUser, ProfileUpdate},
};

/// Register / login / update over a credential store.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: Arc<JwtKeys>,
    hasher: Arc<Hasher>,
    // Verified against when the email is unknown, so both login failures cost one Argon2 run.
    decoy_hash: Arc<str>,
    #[cfg(test)]
    verify_calls: Arc<AtomicUsize>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys, hasher: Hasher) -> anyhow::Result<Self> {
        let decoy_hash = hasher
            .hash(&Uuid::new_v4().to_string())
            .context("compute decoy password hash")?;
        Ok(Self {
            store,
            keys: Arc::new(keys),
            hasher: Arc::new(hasher),
            decoy_hash: decoy_hash.into(),
            #[cfg(test)]
            verify_calls: Arc::default(),
        })
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        req.validate()?;
        let email = normalize_email(&req.email);

        // Fast path only; the unique index on users.email is authoritative.
        if self.store.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash(req.password).await?;
        let name = display_name(&req.first_name, &req.last_name);
        let user = self
            .store
            .insert(NewUser {
                email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                name,
            })
            .await
            .inspect_err(|e| warn!(error = %e, "insert user failed"))?;

        let authtoken = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(RegisterResponse {
            authtoken,
            email: user.email,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(&req.email);

        let found = self.store.find_by_email(&email).await?;
        let stored_hash = match &found {
            Some(user) => user.password_hash.clone(),
            None => self.decoy_hash.to_string(),
        };
        let matches = self.verify(req.password, stored_hash).await?;

        let user = match found {
            Some(user) if matches => user,
            Some(user) => {
                warn!(user_id = %user.id, "login invalid password");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let authtoken = self.keys.sign(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            authtoken,
            user_name: user.first_name,
            user_email: user.email,
        })
    }

    /// Updates the profile of `caller`. `header_email` must name the same
    /// account the caller's token was issued for.
    pub async fn update(
        &self,
        caller: Uuid,
        header_email: Option<&str>,
        req: UpdateRequest,
    ) -> Result<UpdateResponse, AuthError> {
        req.validate()?;

        let email = header_email
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        let Some(user) = self.store.find_by_email(&email).await? else {
            warn!(email = %email, "update unknown email");
            return Err(AuthError::NotFound);
        };
        if user.id != caller {
            warn!(caller = %caller, target = %user.id, "update for another account");
            return Err(AuthError::Forbidden);
        }

        let trimmed = |v: Option<String>| v.map(|v| v.trim().to_string());
        let changes = ProfileUpdate {
            name: trimmed(req.name),
            first_name: trimmed(req.first_name),
            last_name: trimmed(req.last_name),
        };
        let user = if changes.is_empty() {
            user
        } else {
            self.store
                .update_profile(user.id, changes)
                .await?
                .ok_or(AuthError::NotFound)?
        };

        let authtoken = self.keys.sign(user.id)?;
        info!(user_id = %user.id, "user updated");
        Ok(UpdateResponse { authtoken })
    }

    async fn hash(&self, password: String) -> anyhow::Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("hash task")?
    }

    async fn verify(&self, password: String, hash: String) -> anyhow::Result<bool> {
        #[cfg(test)]
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .context("verify task")?
    }
}
