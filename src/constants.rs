use std::{env, path::PathBuf};

use dirs;

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS configuration file name
pub const AWS_CONFIG_FILE_NAME: &str = "config";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Profile used when neither `--profile` nor `AWS_PROFILE` is given
pub const DEFAULT_PROFILE: &str = "default";

/// Section prefix for named profiles in the config file
pub const PROFILE_SECTION_PREFIX: &str = "profile";

/// Section prefix for SSO sessions in the config file
pub const SSO_SESSION_SECTION_PREFIX: &str = "sso-session";

/// Seconds before expiry within which a session token gets refreshed
pub const TOKEN_REFRESH_WINDOW_SECS: i64 = 5 * 60;

/// Grant type sent to SSO-OIDC when exchanging a refresh token
pub const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

/// Version field of the `credential_process` output document
pub const PROCESS_CREDENTIALS_VERSION: u8 = 1;

/// Command users run to obtain a fresh SSO token
pub const SSO_LOGIN_HINT: &str = "aws sso login";

/// Get the AWS config file path
/// Respects AWS_CONFIG_FILE environment variable if set
pub fn get_aws_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CONFIG_FILE_NAME))
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}

/// Get the SSO token cache directory (`~/.aws/sso/cache`)
pub fn get_sso_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join("sso").join("cache"))
}
