use aws_smithy_types::DateTime;
use std::time::SystemTime;

pub mod cache;
pub mod credentials;
pub mod oidc;
pub mod resolver;
pub mod sso;
pub mod token;

/// AWS temporary credentials structure
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
    pub credential_scope: Option<String>,
    pub account_id: Option<String>,
}

/// SSO access token used to call `GetRoleCredentials`
#[derive(Clone, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub expires_at: DateTime,
}

impl Token {
    /// True once `expires_at` is at or before `now`
    pub fn is_expired_at(&self, now: DateTime) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"** redacted **")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) fn now() -> DateTime {
    DateTime::from(SystemTime::now())
}

pub use resolver::{SsoCredentialsProvider, SsoParams};
pub use sso::{RoleCredentialsClient, RoleCredentialsOutput, SsoRoleCredentialsClient};
pub use oidc::{OidcTokenRefresher, TokenRefresher};
pub use token::SsoTokenProvider;
