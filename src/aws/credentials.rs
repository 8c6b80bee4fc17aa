use anyhow::{Context, Result};
use ini::Ini;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing;

use super::{
    Credentials,
    cache::{format_timestamp, parse_timestamp},
};
use crate::constants::{self, PROCESS_CREDENTIALS_VERSION};

/// `credential_process` output document
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessCredentials {
    pub version: u8,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: String,
}

impl From<&Credentials> for ProcessCredentials {
    fn from(creds: &Credentials) -> Self {
        Self {
            version: PROCESS_CREDENTIALS_VERSION,
            access_key_id: creds.access_key_id.clone(),
            secret_access_key: creds.secret_access_key.clone(),
            session_token: creds.session_token.clone(),
            expiration: format_timestamp(&creds.expiration),
        }
    }
}

impl ProcessCredentials {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize credentials")
    }
}

fn get_credentials_path() -> Result<PathBuf> {
    constants::get_aws_credentials_path().context("Failed to determine AWS credentials path")
}

/// Save credentials to AWS credentials file
pub async fn save_credentials(profile: &str, creds: &Credentials) -> Result<PathBuf> {
    let path = get_credentials_path()?;
    save_credentials_to(&path, profile, creds).await?;
    Ok(path)
}

pub async fn save_credentials_to(path: &Path, profile: &str, creds: &Credentials) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut ini = if path.exists() {
        Ini::load_from_file(path).with_context(|| {
            format!("Failed to parse credentials file: {}", path.display())
        })?
    } else {
        Ini::new()
    };

    ini.with_section(Some(profile))
        .set("aws_access_key_id", &creds.access_key_id)
        .set("aws_secret_access_key", &creds.secret_access_key)
        .set("aws_session_token", &creds.session_token)
        .set("aws_session_expiration", format_timestamp(&creds.expiration));

    ini.write_to_file(path)
        .context("Failed to write credentials file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path).await?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions).await?;
    }

    tracing::info!("Credentials saved to profile: {}", profile);
    Ok(())
}

/// Load credentials from AWS credentials file
pub async fn load_credentials(profile: &str) -> Result<Credentials> {
    let path = get_credentials_path()?;
    load_credentials_from(&path, profile).await
}

pub async fn load_credentials_from(path: &Path, profile: &str) -> Result<Credentials> {
    let ini = match path.exists() {
        true => Ini::load_from_file(path).context("Failed to read AWS credentials file")?,
        false => anyhow::bail!("AWS credentials file not found: {}", path.display()),
    };

    let section = ini
        .section(Some(profile))
        .with_context(|| format!("Profile '{profile}' not found in credentials file"))?;

    let access_key_id = section
        .get("aws_access_key_id")
        .context("aws_access_key_id not found")?
        .to_string();

    let secret_access_key = section
        .get("aws_secret_access_key")
        .context("aws_secret_access_key not found")?
        .to_string();

    let session_token = section
        .get("aws_session_token")
        .context("aws_session_token not found")?
        .to_string();

    let expiration_str = section
        .get("aws_session_expiration")
        .context("aws_session_expiration not found")?;

    let expiration =
        parse_timestamp(expiration_str).context("Failed to parse session expiration time")?;

    Ok(Credentials {
        access_key_id,
        secret_access_key,
        session_token,
        expiration,
        credential_scope: None,
        account_id: None,
    })
}
