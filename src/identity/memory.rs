use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::AppError;
use crate::identity::{IdentityProvider, Profile};

/// Token table for development and tests; no network involved.
#[derive(Default)]
pub struct StaticIdentityProvider {
    tokens: DashMap<String, Profile>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_token(&self, token: impl Into<String>, profile: Profile) {
        self.tokens.insert(token.into(), profile);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, access_token: &str) -> Result<Profile, AppError> {
        self.tokens
            .get(access_token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                AppError::AuthenticationRequired("unknown access token".to_string())
            })
    }
}
