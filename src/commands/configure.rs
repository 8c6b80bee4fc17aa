use anyhow::{Context, Result};
use clap::Args;

use crate::{
    config::{self, SsoProfileSettings},
    constants,
};

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigureCommand {
    #[arg(long, help = "SSO start URL (skips the prompts when given with the other values)")]
    pub start_url: Option<String>,

    #[arg(long, help = "SSO region")]
    pub region: Option<String>,

    #[arg(long, help = "AWS account ID")]
    pub account_id: Option<String>,

    #[arg(long, help = "Role name to assume")]
    pub role_name: Option<String>,

    #[arg(long, help = "sso-session name to store the start URL and region under")]
    pub session: Option<String>,
}

impl ConfigureCommand {
    /// Settings when every required value came from flags
    fn settings(&self) -> Option<SsoProfileSettings> {
        Some(SsoProfileSettings {
            start_url: self.start_url.clone()?,
            region: self.region.clone()?,
            account_id: self.account_id.clone()?,
            role_name: self.role_name.clone()?,
            session_name: self.session.clone(),
        })
    }

    pub async fn execute(self, profile: &str) -> Result<()> {
        match self.settings() {
            Some(settings) => {
                let path = constants::get_aws_config_path()
                    .context("Failed to determine AWS config path")?;
                config::save_sso_profile(&path, profile, &settings).await?;
                println!("Configuration saved to {}.", path.display());
                Ok(())
            }
            None => config::configure_interactive(profile).await,
        }
    }
}
