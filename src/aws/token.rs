//! Session token provider for `sso-session` profiles.
//!
//! Returns the cached token for the session, refreshing it through SSO-OIDC when
//! it is inside the refresh window and the cache carries a client registration
//! and refresh token. A refreshed token is written back to the cache.

use aws_smithy_types::DateTime;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    Token,
    cache::{CachedToken, TokenCache, format_timestamp},
    now,
    oidc::{RefreshRequest, TokenRefresher},
};
use crate::{
    constants::TOKEN_REFRESH_WINDOW_SECS,
    error::{ProviderError, Result},
};

#[derive(Clone)]
pub struct SsoTokenProvider {
    cache: TokenCache,
    refresher: Arc<dyn TokenRefresher>,
}

impl SsoTokenProvider {
    pub fn new(cache: TokenCache, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { cache, refresher }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Token for `session_name`, whose OIDC endpoint lives in `sso_region`
    pub async fn token(&self, session_name: &str, sso_region: &str) -> Result<Token> {
        self.token_at(session_name, sso_region, now()).await
    }

    pub(crate) async fn token_at(
        &self,
        session_name: &str,
        sso_region: &str,
        now: DateTime,
    ) -> Result<Token> {
        let cached = self.cache.load(session_name).await?;
        let existing = cached.token()?;

        if existing.expires_at.secs() - now.secs() > TOKEN_REFRESH_WINDOW_SECS {
            debug!("Cached token for sso-session {} is still fresh", session_name);
            return Ok(existing);
        }

        let Some(request) = refresh_request(&cached, sso_region) else {
            debug!("No refresh metadata cached for sso-session {}", session_name);
            return still_valid(existing, now);
        };

        if cached
            .registration_expires_at()
            .is_some_and(|expiry| expiry <= now)
        {
            debug!("Client registration for sso-session {} expired", session_name);
            return still_valid(existing, now);
        }

        let refreshed = match self.refresher.create_token(request).await {
            Ok(refreshed) => refreshed,
            Err(e) if !existing.is_expired_at(now) => {
                warn!("SSO token refresh failed, using cached token: {e}");
                return Ok(existing);
            }
            Err(e) => return Err(e),
        };

        let token = Token {
            access_token: refreshed.access_token.clone(),
            expires_at: DateTime::from_secs(now.secs() + refreshed.expires_in),
        };

        let updated = CachedToken {
            access_token: Some(refreshed.access_token),
            expires_at: Some(format_timestamp(&token.expires_at)),
            refresh_token: refreshed.refresh_token.or(cached.refresh_token.clone()),
            ..cached
        };
        if let Err(e) = self.cache.save(session_name, &updated).await {
            warn!("Failed to write refreshed SSO token to cache: {e}");
        }

        info!("Refreshed SSO token for sso-session {}", session_name);
        Ok(token)
    }
}

fn refresh_request(cached: &CachedToken, sso_region: &str) -> Option<RefreshRequest> {
    Some(RefreshRequest {
        region: sso_region.to_string(),
        client_id: cached.client_id.clone()?,
        client_secret: cached.client_secret.clone()?,
        refresh_token: cached.refresh_token.clone()?,
    })
}

fn still_valid(token: Token, now: DateTime) -> Result<Token> {
    if token.is_expired_at(now) {
        Err(ProviderError::ExpiredSession)
    } else {
        Ok(token)
    }
}
