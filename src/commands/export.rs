use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::aws::{SsoCredentialsProvider, SsoParams, credentials::ProcessCredentials};

/// SSO values that bypass or override the profile
#[derive(Debug, Clone, Default, Args)]
pub struct SsoArgs {
    #[arg(long, help = "SSO start URL")]
    pub start_url: Option<String>,

    #[arg(long, help = "AWS account ID")]
    pub account_id: Option<String>,

    #[arg(long, help = "SSO region")]
    pub region: Option<String>,

    #[arg(long, help = "Role name to assume")]
    pub role_name: Option<String>,

    #[arg(long, help = "sso-session name")]
    pub session: Option<String>,
}

impl From<SsoArgs> for SsoParams {
    fn from(args: SsoArgs) -> Self {
        Self {
            start_url: args.start_url,
            account_id: args.account_id,
            region: args.region,
            role_name: args.role_name,
            session: args.session,
        }
    }
}

/// Print credentials in the `credential_process` format
#[derive(Debug, Clone, Default, Args)]
pub struct ExportCommand {
    #[command(flatten)]
    pub sso: SsoArgs,
}

impl ExportCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        let provider = SsoCredentialsProvider::from_env()
            .await
            .context("Failed to load AWS configuration")?;

        let credentials = provider
            .resolve(profile, &self.sso.into())
            .await
            .with_context(|| format!("Failed to resolve SSO credentials for profile '{profile}'"))?;

        info!("Writing credential_process output");
        println!("{}", ProcessCredentials::from(&credentials).to_json()?);
        Ok(())
    }
}
