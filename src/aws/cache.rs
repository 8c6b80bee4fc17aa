//! On-disk SSO token cache shared with the AWS CLI.
//!
//! Tokens live in `~/.aws/sso/cache/<sha1(key)>.json` where the key is the
//! sso-session name, or the start URL for legacy profiles.

use aws_smithy_types::{
    DateTime,
    date_time::{DateTimeParseError, Format},
};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use super::Token;
use crate::{
    constants,
    error::{ProviderError, Result},
};

/// Cache record as written by `aws sso login`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
}

impl CachedToken {
    /// The access token and its expiry; both must be present and well formed.
    pub fn token(&self) -> Result<Token> {
        let access_token = self
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::invalid_session("cached token has no accessToken"))?;
        let expires_at = self
            .expires_at
            .as_deref()
            .ok_or_else(|| ProviderError::invalid_session("cached token has no expiresAt"))
            .and_then(|raw| {
                parse_timestamp(raw).map_err(|_| {
                    ProviderError::invalid_session(format!("cannot parse expiresAt {raw}"))
                })
            })?;

        Ok(Token {
            access_token,
            expires_at,
        })
    }

    /// `registrationExpiresAt`, if set and parseable
    pub fn registration_expires_at(&self) -> Option<DateTime> {
        self.registration_expires_at
            .as_deref()
            .and_then(|raw| parse_timestamp(raw).ok())
    }
}

/// Parse an RFC 3339 timestamp, with or without a UTC offset.
/// Older CLI versions wrote a literal `UTC` suffix instead of `Z`.
pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime, DateTimeParseError> {
    let normalized = match raw.strip_suffix("UTC") {
        Some(stem) => format!("{stem}Z"),
        None => raw.to_string(),
    };
    DateTime::from_str(&normalized, Format::DateTime)
        .or_else(|_| DateTime::from_str(&normalized, Format::DateTimeWithOffset))
}

/// Format a timestamp the way the cache and credentials files store it
pub fn format_timestamp(value: &DateTime) -> String {
    value
        .fmt(Format::DateTime)
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Directory of cached SSO tokens
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The cache under the user's home directory
    pub fn default_location() -> Result<Self> {
        constants::get_sso_cache_dir()
            .map(Self::new)
            .ok_or_else(|| ProviderError::invalid_session("cannot determine home directory"))
    }

    /// Path of the cache file for `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_file_stem(key)))
    }

    pub async fn load(&self, key: &str) -> Result<CachedToken> {
        let path = self.path_for(key);
        debug!("Reading SSO token cache {}", path.display());

        let content = fs::read_to_string(&path).await.map_err(|e| {
            ProviderError::invalid_session(format!(
                "cannot read token cache {}: {e}",
                path.display()
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            ProviderError::invalid_session(format!(
                "cannot parse token cache {}: {e}",
                path.display()
            ))
        })
    }

    pub async fn save(&self, key: &str, token: &CachedToken) -> std::io::Result<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).await?;

        let content = serde_json::to_string_pretty(token)?;
        fs::write(&path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, permissions).await?;
        }

        debug!("SSO token cache written: {}", path.display());
        Ok(())
    }
}

/// Lowercase hex SHA-1 of the cache key
pub fn cache_file_stem(key: &str) -> String {
    let digest = Sha1::digest(key.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_file_stem_matches_aws_cli() {
        assert_eq!(cache_file_stem("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(cache_file_stem("").len(), 40);
    }

    #[test]
    fn test_cached_token_parses_cli_format() {
        let json = r#"{
            "startUrl": "https://d-123.awsapps.com/start",
            "region": "us-east-1",
            "accessToken": "token-value",
            "expiresAt": "2030-01-01T00:00:00Z",
            "clientId": "cid",
            "clientSecret": "csecret",
            "registrationExpiresAt": "2030-06-01T00:00:00Z",
            "refreshToken": "rtoken"
        }"#;
        let cached: CachedToken = serde_json::from_str(json).unwrap();
        let token = cached.token().unwrap();

        assert_eq!(token.access_token, "token-value");
        assert_eq!(token.expires_at, DateTime::from_secs(1_893_456_000));
        assert_eq!(cached.refresh_token.as_deref(), Some("rtoken"));
        assert!(cached.registration_expires_at().is_some());
    }

    #[test]
    fn test_cached_token_accepts_offset_timestamps() {
        let cached = CachedToken {
            access_token: Some("t".into()),
            expires_at: Some("2030-01-01T09:00:00+09:00".into()),
            ..Default::default()
        };
        assert_eq!(
            cached.token().unwrap().expires_at,
            DateTime::from_secs(1_893_456_000)
        );
    }

    #[test]
    fn test_parse_legacy_utc_suffix() {
        assert_eq!(
            parse_timestamp("2030-01-01T00:00:00UTC").unwrap(),
            DateTime::from_secs(1_893_456_000)
        );
    }

    #[test]
    fn test_cached_token_requires_access_token_and_expiry() {
        let missing_token = CachedToken {
            expires_at: Some("2030-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert!(matches!(
            missing_token.token(),
            Err(ProviderError::InvalidSession { .. })
        ));

        let bad_expiry = CachedToken {
            access_token: Some("t".into()),
            expires_at: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad_expiry.token(),
            Err(ProviderError::InvalidSession { .. })
        ));
    }

    #[test]
    fn test_timestamp_round_trip_preserves_instant() {
        let original = DateTime::from_secs(1_735_689_600);
        let parsed = parse_timestamp(&format_timestamp(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("cache"));
        let record = CachedToken {
            access_token: Some("abc".into()),
            expires_at: Some("2030-01-01T00:00:00Z".into()),
            refresh_token: Some("refresh".into()),
            ..Default::default()
        };

        cache.save("corp", &record).await.unwrap();
        assert!(cache.path_for("corp").exists());
        assert_eq!(cache.load("corp").await.unwrap(), record);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(cache.path_for("corp"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_load_missing_is_invalid_session() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path());
        assert!(matches!(
            cache.load("https://nowhere/start").await,
            Err(ProviderError::InvalidSession { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_malformed_is_invalid_session() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path());
        std::fs::write(cache.path_for("broken"), "{not json").unwrap();
        assert!(matches!(
            cache.load("broken").await,
            Err(ProviderError::InvalidSession { .. })
        ));
    }
}
