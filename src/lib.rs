//! Resolve short-lived AWS role credentials for IAM Identity Center (SSO)
//! profiles.
//!
//! The entry point is [`aws::resolver::SsoCredentialsProvider`], which reads the
//! shared config files, loads or refreshes the cached SSO token and exchanges it
//! for role credentials.

pub mod aws;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;

pub use aws::{Credentials, Token};
pub use error::ProviderError;
