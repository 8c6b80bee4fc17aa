use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssooidc::{Client as OidcClient, error::DisplayErrorContext};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use crate::{
    constants::REFRESH_TOKEN_GRANT_TYPE,
    error::{ProviderError, Result},
};

/// Inputs of an SSO-OIDC `CreateToken` call with the refresh-token grant
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub region: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Fields of a `CreateToken` response this crate uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Lifetime in seconds from now
    pub expires_in: i64,
    /// Rotated refresh token, when the service issues one
    pub refresh_token: Option<String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn create_token(&self, request: RefreshRequest) -> Result<RefreshedToken>;
}

/// [`TokenRefresher`] backed by `aws-sdk-ssooidc`
#[derive(Debug, Clone, Default)]
pub struct OidcTokenRefresher;

impl OidcTokenRefresher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenRefresher for OidcTokenRefresher {
    async fn create_token(&self, request: RefreshRequest) -> Result<RefreshedToken> {
        info!("Refreshing SSO token via SSO-OIDC (region: {})", request.region);

        // CreateToken is authenticated by the client registration, not SigV4
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(request.region.clone()))
            .no_credentials()
            .load()
            .await;
        let client = OidcClient::new(&config);

        let output = client
            .create_token()
            .client_id(request.client_id)
            .client_secret(request.client_secret)
            .grant_type(REFRESH_TOKEN_GRANT_TYPE)
            .refresh_token(request.refresh_token)
            .send()
            .await
            .map_err(|e| ProviderError::TokenRefresh {
                message: DisplayErrorContext(&e).to_string(),
                source: Some(e.into()),
            })?;

        let access_token = output
            .access_token()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::TokenRefresh {
                message: "SSO-OIDC response does not contain accessToken".into(),
                source: None,
            })?
            .to_string();

        debug!("SSO token refreshed, expires in {}s", output.expires_in());
        Ok(RefreshedToken {
            access_token,
            expires_in: i64::from(output.expires_in()),
            refresh_token: output.refresh_token().map(str::to_string),
        })
    }
}
