//! Resolve role credentials for an SSO profile.

use aws_smithy_types::DateTime;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    Credentials, Token,
    cache::TokenCache,
    now,
    oidc::{OidcTokenRefresher, TokenRefresher},
    sso::{RoleCredentialsClient, RoleCredentialsOutput, SsoRoleCredentialsClient},
    token::SsoTokenProvider,
};
use crate::{
    config::{Profile, SharedConfig},
    error::{ProviderError, Result},
};

/// Explicit SSO parameters. When account id, role name and session are all
/// unset the named profile is loaded and `start_url`/`region` act as overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsoParams {
    pub start_url: Option<String>,
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub role_name: Option<String>,
    pub session: Option<String>,
}

impl SsoParams {
    fn is_explicit(&self) -> bool {
        self.account_id.is_some() || self.role_name.is_some() || self.session.is_some()
    }
}

/// Fully validated SSO settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSso {
    pub start_url: String,
    pub account_id: String,
    pub region: String,
    pub role_name: String,
    pub session: Option<String>,
}

impl ResolvedSso {
    /// Token cache key: the session name, or the start URL for legacy profiles
    pub fn cache_key(&self) -> &str {
        self.session.as_deref().unwrap_or(&self.start_url)
    }
}

#[derive(Clone)]
pub struct SsoCredentialsProvider {
    config: SharedConfig,
    cache: TokenCache,
    tokens: SsoTokenProvider,
    client: Arc<dyn RoleCredentialsClient>,
}

impl SsoCredentialsProvider {
    pub fn new(
        config: SharedConfig,
        cache: TokenCache,
        refresher: Arc<dyn TokenRefresher>,
        client: Arc<dyn RoleCredentialsClient>,
    ) -> Self {
        let tokens = SsoTokenProvider::new(cache.clone(), refresher);
        Self {
            config,
            cache,
            tokens,
            client,
        }
    }

    /// Provider backed by the user's shared config files, token cache and the
    /// AWS SDK clients.
    pub async fn from_env() -> Result<Self> {
        let config = SharedConfig::load().await?;
        let cache = TokenCache::default_location()?;
        Ok(Self::new(
            config,
            cache,
            Arc::new(OidcTokenRefresher::new()),
            Arc::new(SsoRoleCredentialsClient::new()),
        ))
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Resolve credentials for `profile_name`
    pub async fn resolve(&self, profile_name: &str, params: &SsoParams) -> Result<Credentials> {
        info!("Resolving SSO credentials for profile: {}", profile_name);

        let sso = self.resolve_settings(profile_name, params)?;
        let token = self.load_token(&sso).await?;

        if token.is_expired_at(now()) {
            return Err(ProviderError::ExpiredSession);
        }

        let output = self
            .client
            .get_role_credentials(
                &sso.region,
                &sso.account_id,
                &sso.role_name,
                &token.access_token,
            )
            .await
            .map_err(|e| match e {
                ProviderError::RemoteCall { .. } => e,
                other => ProviderError::remote("GetRoleCredentials failed", other),
            })?;

        let credentials = validate_credentials(output, &sso.account_id)?;
        info!("Successfully obtained SSO role credentials");
        Ok(credentials)
    }

    /// Work out the SSO settings for a profile without touching the network.
    pub fn resolve_settings(&self, profile_name: &str, params: &SsoParams) -> Result<ResolvedSso> {
        if params.is_explicit() {
            return resolve_explicit(params);
        }

        let profile = self
            .config
            .profile(profile_name)
            .ok_or_else(|| ProviderError::ProfileNotFound(profile_name.to_string()))?;
        if !profile.is_sso_profile() {
            return Err(ProviderError::NotSsoProfile(profile_name.to_string()));
        }

        let mut profile = profile.clone();
        if let Some(session_name) = profile.sso_session.clone() {
            let session = self.config.session(&session_name).ok_or_else(|| {
                ProviderError::SessionNotFound {
                    profile: profile_name.to_string(),
                    session: session_name.clone(),
                }
            })?;

            let conflict = |field| ProviderError::ConflictingSessionConfiguration {
                field,
                profile: profile_name.to_string(),
                session: session_name.clone(),
            };
            if conflicts(params.region.as_deref(), session.sso_region.as_deref()) {
                return Err(conflict("region"));
            }
            if conflicts(
                params.start_url.as_deref(),
                session.sso_start_url.as_deref(),
            ) {
                return Err(conflict("start_url"));
            }

            // session values replace whatever the profile itself carries
            profile.sso_region = session.sso_region.clone();
            profile.sso_start_url = session.sso_start_url.clone();
        }

        if let Some(start_url) = &params.start_url {
            profile.sso_start_url = Some(start_url.clone());
        }
        if let Some(region) = &params.region {
            profile.sso_region = Some(region.clone());
        }

        validate_profile(profile)
    }

    async fn load_token(&self, sso: &ResolvedSso) -> Result<Token> {
        match &sso.session {
            Some(session) => {
                debug!("Using sso-session token for {}", session);
                self.tokens.token(session, &sso.region).await
            }
            None => {
                debug!("Using legacy token cache for {}", sso.start_url);
                self.cache.load(&sso.start_url).await?.token()
            }
        }
    }
}

fn conflicts(profile_value: Option<&str>, session_value: Option<&str>) -> bool {
    matches!((profile_value, session_value), (Some(p), Some(s)) if p != s)
}

fn validate_profile(profile: Profile) -> Result<ResolvedSso> {
    let missing: Vec<&'static str> = [
        ("sso_start_url", profile.sso_start_url.is_none()),
        ("sso_account_id", profile.sso_account_id.is_none()),
        ("sso_region", profile.sso_region.is_none()),
        ("sso_role_name", profile.sso_role_name.is_none()),
    ]
    .into_iter()
    .filter_map(|(key, absent)| absent.then_some(key))
    .collect();

    match (
        profile.sso_start_url,
        profile.sso_account_id,
        profile.sso_region,
        profile.sso_role_name,
    ) {
        (Some(start_url), Some(account_id), Some(region), Some(role_name)) => Ok(ResolvedSso {
            start_url,
            account_id,
            region,
            role_name,
            session: profile.sso_session,
        }),
        _ => Err(ProviderError::IncompleteProfile {
            profile: profile.name,
            missing,
        }),
    }
}

fn resolve_explicit(params: &SsoParams) -> Result<ResolvedSso> {
    match (
        &params.start_url,
        &params.account_id,
        &params.region,
        &params.role_name,
    ) {
        (Some(start_url), Some(account_id), Some(region), Some(role_name)) => Ok(ResolvedSso {
            start_url: start_url.clone(),
            account_id: account_id.clone(),
            region: region.clone(),
            role_name: role_name.clone(),
            session: params.session.clone(),
        }),
        _ => {
            let missing = [
                ("start_url", params.start_url.is_none()),
                ("account_id", params.account_id.is_none()),
                ("region", params.region.is_none()),
                ("role_name", params.role_name.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, absent)| absent.then_some(key))
            .collect();
            Err(ProviderError::IncompleteConfiguration { missing })
        }
    }
}

fn validate_credentials(output: RoleCredentialsOutput, account_id: &str) -> Result<Credentials> {
    let RoleCredentialsOutput {
        access_key_id: Some(access_key_id),
        secret_access_key: Some(secret_access_key),
        session_token: Some(session_token),
        expiration: Some(expiration),
        credential_scope,
    } = output
    else {
        return Err(ProviderError::InvalidCredential);
    };

    Ok(Credentials {
        access_key_id,
        secret_access_key,
        session_token,
        expiration: DateTime::from_millis(expiration),
        credential_scope,
        account_id: Some(account_id.to_string()),
    })
}
