use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sso::{Client as SsoClient, error::DisplayErrorContext};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use crate::error::{ProviderError, Result};

/// Role credentials as returned by `GetRoleCredentials`, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCredentialsOutput {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Epoch milliseconds
    pub expiration: Option<i64>,
    pub credential_scope: Option<String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleCredentialsClient: Send + Sync {
    async fn get_role_credentials(
        &self,
        region: &str,
        account_id: &str,
        role_name: &str,
        access_token: &str,
    ) -> Result<RoleCredentialsOutput>;
}

/// [`RoleCredentialsClient`] backed by `aws-sdk-sso`
#[derive(Debug, Clone, Default)]
pub struct SsoRoleCredentialsClient;

impl SsoRoleCredentialsClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RoleCredentialsClient for SsoRoleCredentialsClient {
    async fn get_role_credentials(
        &self,
        region: &str,
        account_id: &str,
        role_name: &str,
        access_token: &str,
    ) -> Result<RoleCredentialsOutput> {
        info!("Calling AWS SSO GetRoleCredentials");
        debug!("Region: {}", region);
        debug!("Account ID: {}", account_id);
        debug!("Role name: {}", role_name);

        // GetRoleCredentials is authorized by the bearer access token
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;
        let client = SsoClient::new(&config);

        let response = client
            .get_role_credentials()
            .account_id(account_id)
            .role_name(role_name)
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| {
                let message = format!(
                    "Failed to get SSO role credentials: {}",
                    DisplayErrorContext(&e)
                );
                ProviderError::remote(message, e)
            })?;

        let Some(creds) = response.role_credentials() else {
            return Ok(RoleCredentialsOutput::default());
        };

        Ok(RoleCredentialsOutput {
            access_key_id: creds.access_key_id().map(str::to_string),
            secret_access_key: creds.secret_access_key().map(str::to_string),
            session_token: creds.session_token().map(str::to_string),
            expiration: Some(creds.expiration()).filter(|ms| *ms > 0),
            credential_scope: None,
        })
    }
}
