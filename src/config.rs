use crate::{
    constants::{
        self, DEFAULT_PROFILE, PROFILE_SECTION_PREFIX, SSO_SESSION_SECTION_PREFIX,
    },
    error::{ProviderError, Result},
};
use anyhow::Context;
use dialoguer::{Input, theme::ColorfulTheme};
use ini::{Ini, Properties};
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::debug;

/// Scope requested when registering a client for an sso-session
const DEFAULT_REGISTRATION_SCOPES: &str = "sso:account:access";

/// SSO settings of a named profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub sso_start_url: Option<String>,
    pub sso_account_id: Option<String>,
    pub sso_region: Option<String>,
    pub sso_role_name: Option<String>,
    pub sso_session: Option<String>,
}

impl Profile {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Overlay the SSO keys present in `section`; absent keys keep their value.
    fn apply_section(&mut self, section: &Properties) {
        let fields = [
            ("sso_start_url", &mut self.sso_start_url),
            ("sso_account_id", &mut self.sso_account_id),
            ("sso_region", &mut self.sso_region),
            ("sso_role_name", &mut self.sso_role_name),
            ("sso_session", &mut self.sso_session),
        ];
        for (key, field) in fields {
            if let Some(value) = non_empty(section.get(key)) {
                *field = Some(value);
            }
        }
    }

    /// True if the profile carries any of the SSO keys
    pub fn is_sso_profile(&self) -> bool {
        self.sso_start_url.is_some()
            || self.sso_account_id.is_some()
            || self.sso_session.is_some()
            || self.sso_region.is_some()
            || self.sso_role_name.is_some()
    }
}

/// A `[sso-session NAME]` section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsoSession {
    pub name: String,
    pub sso_region: Option<String>,
    pub sso_start_url: Option<String>,
    pub sso_registration_scopes: Option<String>,
}

impl SsoSession {
    fn from_ini_section(name: &str, section: &Properties) -> Self {
        Self {
            name: name.to_string(),
            sso_region: non_empty(section.get("sso_region")),
            sso_start_url: non_empty(section.get("sso_start_url")),
            sso_registration_scopes: non_empty(section.get("sso_registration_scopes")),
        }
    }
}

/// Profiles and sso-sessions merged from the shared config and credentials files
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    profiles: HashMap<String, Profile>,
    sessions: HashMap<String, SsoSession>,
}

impl SharedConfig {
    /// Load from the default locations, honouring `AWS_CONFIG_FILE` and
    /// `AWS_SHARED_CREDENTIALS_FILE`.
    pub async fn load() -> Result<Self> {
        let config_path = constants::get_aws_config_path();
        let credentials_path = constants::get_aws_credentials_path();
        Self::load_from(config_path.as_deref(), credentials_path.as_deref()).await
    }

    /// Load from explicit paths. Missing files are treated as empty.
    pub async fn load_from(
        config_path: Option<&Path>,
        credentials_path: Option<&Path>,
    ) -> Result<Self> {
        let config = match config_path {
            Some(path) => read_ini(path).await?,
            None => None,
        };
        let credentials = match credentials_path {
            Some(path) => read_ini(path).await?,
            None => None,
        };

        let shared = Self::from_ini(config.as_ref(), credentials.as_ref());
        debug!(
            "Loaded {} profiles and {} sso-sessions",
            shared.profiles.len(),
            shared.sessions.len()
        );
        Ok(shared)
    }

    /// Merge parsed files. Keys from the credentials file win over the config file.
    pub fn from_ini(config: Option<&Ini>, credentials: Option<&Ini>) -> Self {
        let mut shared = Self::default();

        if let Some(ini) = config {
            for (name, section) in ini.iter() {
                match name.map(parse_config_section) {
                    Some(Some(ConfigSection::Profile(profile))) => {
                        shared.profile_entry(profile).apply_section(section);
                    }
                    Some(Some(ConfigSection::Session(session))) => {
                        shared.sessions.insert(
                            session.to_string(),
                            SsoSession::from_ini_section(session, section),
                        );
                    }
                    _ => {}
                }
            }
        }

        if let Some(ini) = credentials {
            for (name, section) in ini.iter() {
                if let Some(profile) = name.map(str::trim).filter(|n| !n.is_empty()) {
                    shared.profile_entry(profile).apply_section(section);
                }
            }
        }

        shared
    }

    fn profile_entry(&mut self, name: &str) -> &mut Profile {
        self.profiles
            .entry(name.to_string())
            .or_insert_with(|| Profile::new(name))
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn session(&self, name: &str) -> Option<&SsoSession> {
        self.sessions.get(name)
    }
}

enum ConfigSection<'a> {
    Profile(&'a str),
    Session(&'a str),
}

/// `[default]` and `[profile NAME]` are profiles, `[sso-session NAME]` is a session.
fn parse_config_section(name: &str) -> Option<ConfigSection<'_>> {
    let name = name.trim();
    if name == DEFAULT_PROFILE {
        return Some(ConfigSection::Profile(name));
    }

    let (prefix, rest) = name.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    match prefix {
        PROFILE_SECTION_PREFIX => Some(ConfigSection::Profile(rest)),
        SSO_SESSION_SECTION_PREFIX => Some(ConfigSection::Session(rest)),
        _ => None,
    }
}

async fn read_ini(path: &Path) -> Result<Option<Ini>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Config file {} not found, skipping", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(ProviderError::ConfigLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };

    Ini::load_from_str(&content)
        .map(Some)
        .map_err(|e| ProviderError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn profile_section_name(profile: &str) -> String {
    if profile == DEFAULT_PROFILE {
        profile.to_string()
    } else {
        format!("{PROFILE_SECTION_PREFIX} {profile}")
    }
}

/// Values collected by `ssocreds configure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoProfileSettings {
    pub start_url: String,
    pub region: String,
    pub account_id: String,
    pub role_name: String,
    pub session_name: Option<String>,
}

impl SsoProfileSettings {
    fn save_to_ini(&self, ini: &mut Ini, profile: &str) {
        let section = profile_section_name(profile);

        match &self.session_name {
            Some(session) => {
                ini.with_section(Some(format!("{SSO_SESSION_SECTION_PREFIX} {session}")))
                    .set("sso_start_url", &self.start_url)
                    .set("sso_region", &self.region)
                    .set("sso_registration_scopes", DEFAULT_REGISTRATION_SCOPES);

                ini.with_section(Some(section.clone()))
                    .set("sso_session", session)
                    .set("sso_account_id", &self.account_id)
                    .set("sso_role_name", &self.role_name);
                // the session owns these now
                if let Some(props) = ini.section_mut(Some(section)) {
                    props.remove("sso_start_url");
                    props.remove("sso_region");
                }
            }
            None => {
                ini.with_section(Some(section.clone()))
                    .set("sso_start_url", &self.start_url)
                    .set("sso_region", &self.region)
                    .set("sso_account_id", &self.account_id)
                    .set("sso_role_name", &self.role_name);
                if let Some(props) = ini.section_mut(Some(section)) {
                    props.remove("sso_session");
                }
            }
        }
    }
}

/// Write SSO settings for `profile` into the config file at `path`, keeping
/// every other section.
pub async fn save_sso_profile(
    path: &Path,
    profile: &str,
    settings: &SsoProfileSettings,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut ini = if path.exists() {
        Ini::load_from_file(path)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    } else {
        Ini::new()
    };

    settings.save_to_ini(&mut ini, profile);

    ini.write_to_file(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

pub async fn configure_interactive(profile: &str) -> anyhow::Result<()> {
    println!("Configuring SSO for profile: {profile}");

    let path = get_config_path()?;
    let shared = SharedConfig::load_from(Some(path.as_path()), None)
        .await
        .context("Failed to read existing AWS config")?;
    let existing = shared.profile(profile).cloned().unwrap_or_default();
    let existing_session = existing
        .sso_session
        .as_deref()
        .and_then(|name| shared.session(name));

    if existing.is_sso_profile() {
        println!("Press Enter to keep current values, or type new values.");
    }
    println!();

    let theme = ColorfulTheme::default();

    let start_url = Input::<String>::with_theme(&theme)
        .with_prompt("SSO start URL")
        .default(
            existing_session
                .and_then(|s| s.sso_start_url.clone())
                .or(existing.sso_start_url.clone())
                .unwrap_or_default(),
        )
        .validate_with(|input: &String| {
            if input.starts_with("https://") {
                Ok(())
            } else {
                Err("SSO start URL must start with https://")
            }
        })
        .interact_text()
        .context("Failed to read SSO start URL")?;

    let region = Input::<String>::with_theme(&theme)
        .with_prompt("SSO region")
        .default(
            existing_session
                .and_then(|s| s.sso_region.clone())
                .or(existing.sso_region.clone())
                .unwrap_or_else(|| "us-east-1".to_string()),
        )
        .interact_text()
        .context("Failed to read SSO region")?;

    let account_id = Input::<String>::with_theme(&theme)
        .with_prompt("AWS account ID")
        .default(existing.sso_account_id.clone().unwrap_or_default())
        .validate_with(|input: &String| {
            if is_valid_account_id(input) {
                Ok(())
            } else {
                Err("AWS account ID must be 12 digits")
            }
        })
        .interact_text()
        .context("Failed to read AWS account ID")?;

    let role_name = Input::<String>::with_theme(&theme)
        .with_prompt("Role name")
        .default(existing.sso_role_name.clone().unwrap_or_default())
        .interact_text()
        .context("Failed to read role name")?;

    let session_name = Input::<String>::with_theme(&theme)
        .with_prompt("sso-session name (leave empty for legacy profile)")
        .default(existing.sso_session.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .context("Failed to read sso-session name")?;

    let settings = SsoProfileSettings {
        start_url,
        region,
        account_id,
        role_name,
        session_name: non_empty(Some(&session_name)),
    };

    save_sso_profile(&path, profile, &settings).await?;

    println!("\nConfiguration saved to {}.", path.display());
    Ok(())
}

fn get_config_path() -> anyhow::Result<PathBuf> {
    constants::get_aws_config_path().context("Failed to determine AWS config path")
}

fn is_valid_account_id(s: &str) -> bool {
    s.len() == 12 && s.chars().all(|c| c.is_ascii_digit())
}
