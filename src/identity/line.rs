use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::identity::{IdentityProvider, Profile};

const VERIFY_URL: &str = "https://api.line.me/oauth2/v2.1/verify";
const PROFILE_URL: &str = "https://api.line.me/v2/profile";

/// Verifies LINE access tokens against the official endpoints and rejects
/// tokens issued for another channel.
pub struct LineIdentityProvider {
    http: reqwest::Client,
    channel_id: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    client_id: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "displayName")]
    display_name: String,
}

impl LineIdentityProvider {
    pub fn new(channel_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            channel_id,
        }
    }
}

#[async_trait]
impl IdentityProvider for LineIdentityProvider {
    async fn verify(&self, access_token: &str) -> Result<Profile, AppError> {
        let response = self
            .http
            .get(VERIFY_URL)
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|err| AppError::Internal(format!("token verify request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::AuthenticationRequired(
                "access token rejected; log in through LINE again".to_string(),
            ));
        }

        let verify: VerifyResponse = response
            .json()
            .await
            .map_err(|err| AppError::Internal(format!("malformed verify response: {err}")))?;

        if verify.client_id != self.channel_id || verify.expires_in <= 0 {
            return Err(AppError::AuthenticationRequired(
                "access token not valid for this channel".to_string(),
            ));
        }

        let response = self
            .http
            .get(PROFILE_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| AppError::Internal(format!("profile request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::AuthenticationRequired(
                "profile lookup rejected; log in through LINE again".to_string(),
            ));
        }

        let profile: ProfileResponse = response
            .json()
            .await
            .map_err(|err| AppError::Internal(format!("malformed profile response: {err}")))?;

        Ok(Profile {
            user_id: profile.user_id,
            display_name: profile.display_name,
        })
    }
}
