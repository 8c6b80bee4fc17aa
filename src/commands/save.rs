use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::SsoArgs;
use crate::aws::{self, SsoCredentialsProvider, cache::format_timestamp};

/// Resolve credentials and store them in the shared credentials file
#[derive(Debug, Clone, Default, Args)]
pub struct SaveCommand {
    #[arg(
        short = 't',
        long,
        help = "Credentials file section to write (defaults to the profile name)"
    )]
    pub target: Option<String>,

    #[command(flatten)]
    pub sso: SsoArgs,
}

impl SaveCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        let target = self.target.as_deref().unwrap_or(profile).to_string();
        info!("Saving SSO credentials for {} into [{}]", profile, target);

        let provider = SsoCredentialsProvider::from_env()
            .await
            .context("Failed to load AWS configuration")?;

        let credentials = provider
            .resolve(profile, &self.sso.into())
            .await
            .with_context(|| format!("Failed to resolve SSO credentials for profile '{profile}'"))?;

        let path = aws::credentials::save_credentials(&target, &credentials)
            .await
            .context("Failed to save AWS credentials")?;

        println!("AWS credentials saved to [{target}] in {}.", path.display());
        println!(
            "Credentials will expire at: {}",
            format_timestamp(&credentials.expiration)
        );

        Ok(())
    }
}
