use anyhow::{Context, Result};
use aws_smithy_types::DateTime;
use clap::Args;

use super::SsoArgs;
use crate::{
    aws::{SsoCredentialsProvider, cache::format_timestamp, now},
    constants::TOKEN_REFRESH_WINDOW_SECS,
    error::ProviderError,
};

/// Report the cached SSO token used by a profile without calling AWS
#[derive(Debug, Clone, Default, Args)]
pub struct StatusCommand {
    #[command(flatten)]
    pub sso: SsoArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenState {
    Valid(DateTime),
    Expiring(DateTime),
    Expired(DateTime),
    Unusable(String),
}

impl TokenState {
    fn classify(token: Result<crate::Token, ProviderError>, now: DateTime) -> Self {
        match token {
            Ok(token) if token.is_expired_at(now) => Self::Expired(token.expires_at),
            Ok(token) if token.expires_at.secs() - now.secs() <= TOKEN_REFRESH_WINDOW_SECS => {
                Self::Expiring(token.expires_at)
            }
            Ok(token) => Self::Valid(token.expires_at),
            Err(e) => Self::Unusable(e.to_string()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Valid(at) => format!("valid until {}", format_timestamp(at)),
            Self::Expiring(at) => format!("expiring soon ({})", format_timestamp(at)),
            Self::Expired(at) => format!("expired at {}", format_timestamp(at)),
            Self::Unusable(reason) => format!("unusable: {reason}"),
        }
    }
}

impl StatusCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        let provider = SsoCredentialsProvider::from_env()
            .await
            .context("Failed to load AWS configuration")?;

        let sso = provider
            .resolve_settings(profile, &self.sso.into())
            .with_context(|| format!("Profile '{profile}' cannot be used for SSO"))?;

        let cache = provider.token_cache();
        let key = sso.cache_key();
        let token = cache
            .load(key)
            .await
            .and_then(|cached| cached.token());
        let state = TokenState::classify(token, now());

        println!("Profile:     {profile}");
        println!("Start URL:   {}", sso.start_url);
        println!("Region:      {}", sso.region);
        println!("Account ID:  {}", sso.account_id);
        println!("Role name:   {}", sso.role_name);
        if let Some(session) = &sso.session {
            println!("sso-session: {session}");
        }
        println!("Token cache: {}", cache.path_for(key).display());
        println!("Token:       {}", state.describe());

        Ok(())
    }
}
