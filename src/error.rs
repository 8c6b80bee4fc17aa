//! Errors raised while resolving SSO credentials.
//!
//! Every failure is a [`ProviderError`]. None of them are fatal to a credential
//! provider chain: [`ProviderError::stops_chain`] is `false` so a caller can move
//! on to the next provider.

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::SSO_LOGIN_HINT;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("Profile {0} could not be found in the shared config files.")]
    ProfileNotFound(String),

    #[error("Profile {0} is not configured with SSO credentials.")]
    NotSsoProfile(String),

    #[error("sso-session {session} referenced by profile {profile} could not be found.")]
    SessionNotFound { profile: String, session: String },

    #[error(
        "Conflicting SSO {field} configurations in profile {profile} and sso-session {session}."
    )]
    ConflictingSessionConfiguration {
        field: &'static str,
        profile: String,
        session: String,
    },

    #[error(
        "Profile {profile} is configured with invalid SSO credentials. Missing required keys: {}",
        .missing.join(", ")
    )]
    IncompleteProfile {
        profile: String,
        missing: Vec<&'static str>,
    },

    #[error("Incomplete configuration. Missing SSO parameters: {}", .missing.join(", "))]
    IncompleteConfiguration { missing: Vec<&'static str> },

    #[error(
        "The SSO session associated with this profile is invalid ({reason}). To refresh this SSO session run {} with the corresponding profile.",
        SSO_LOGIN_HINT
    )]
    InvalidSession { reason: String },

    #[error(
        "The SSO session associated with this profile has expired. To refresh this SSO session run {} with the corresponding profile.",
        SSO_LOGIN_HINT
    )]
    ExpiredSession,

    #[error("Failed to refresh SSO token: {message}")]
    TokenRefresh {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{message}")]
    RemoteCall {
        message: String,
        stops_chain: bool,
        #[source]
        source: BoxError,
    },

    #[error("SSO returns an invalid temporary credential.")]
    InvalidCredential,

    #[error("Failed to load config file {}: {message}", .path.display())]
    ConfigLoad { path: PathBuf, message: String },
}

impl ProviderError {
    /// Whether a credential provider chain should stop instead of trying the
    /// next provider.
    pub fn stops_chain(&self) -> bool {
        match self {
            Self::RemoteCall { stops_chain, .. } => *stops_chain,
            _ => false,
        }
    }

    /// Wrap a failed remote call, keeping the failure as the error source.
    pub(crate) fn remote(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        let source = source.into();
        let stops_chain = source
            .downcast_ref::<ProviderError>()
            .is_some_and(ProviderError::stops_chain);
        Self::RemoteCall {
            message: message.into(),
            stops_chain,
            source,
        }
    }

    pub(crate) fn invalid_session(reason: impl Into<String>) -> Self {
        Self::InvalidSession {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
