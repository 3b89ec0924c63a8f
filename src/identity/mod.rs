pub mod line;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
}

/// Verifies a client-supplied access token and resolves the stable identity
/// behind it. The rest of the flow only ever sees the opaque `user_id`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, access_token: &str) -> Result<Profile, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityBackend {
    Line,
    Static,
}

impl std::str::FromStr for IdentityBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(IdentityBackend::Line),
            "static" => Ok(IdentityBackend::Static),
            other => Err(format!("unknown identity backend: {other}")),
        }
    }
}
