use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::{
    commands::{CompletionsCommand, ConfigureCommand, ExportCommand, SaveCommand, StatusCommand},
    constants::DEFAULT_PROFILE,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "ssocreds", version, about = "Resolve AWS role credentials from IAM Identity Center (SSO) profiles", long_about = None, arg_required_else_help = false)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        env = "AWS_PROFILE",
        default_value = DEFAULT_PROFILE,
        help = "AWS profile name"
    )]
    pub profile: String,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Print role credentials as credential_process JSON")]
    Export(ExportCommand),
    #[command(about = "Write role credentials to the shared credentials file")]
    Save(SaveCommand),
    #[command(about = "Show the cached SSO token used by the profile")]
    Status(StatusCommand),
    #[command(about = "Configure an SSO profile in the AWS config file")]
    Configure(ConfigureCommand),
    #[command(about = "Generate shell completion scripts for ssocreds")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let profile = self.profile;
        let command = self
            .command
            .unwrap_or_else(|| Commands::Export(ExportCommand::default()));

        match command {
            Commands::Export(cmd) => cmd.execute(&profile).await,
            Commands::Save(cmd) => cmd.execute(&profile).await,
            Commands::Status(cmd) => cmd.execute(&profile).await,
            Commands::Configure(cmd) => cmd.execute(&profile).await,
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};
    use serial_test::serial;
    use std::env;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    #[serial]
    fn test_profile_default_value() {
        let original = env::var("AWS_PROFILE").ok();
        unsafe {
            env::remove_var("AWS_PROFILE");
        }

        let cli = parse(&["ssocreds", "export"]);

        unsafe {
            if let Some(val) = original {
                env::set_var("AWS_PROFILE", val);
            }
        }
        assert_eq!(cli.profile, "default");
    }

    #[test]
    #[serial]
    fn test_profile_from_env() {
        let original = env::var("AWS_PROFILE").ok();
        unsafe {
            env::set_var("AWS_PROFILE", "staging");
        }

        let cli = parse(&["ssocreds"]);

        unsafe {
            match original {
                Some(val) => env::set_var("AWS_PROFILE", val),
                None => env::remove_var("AWS_PROFILE"),
            }
        }
        assert_eq!(cli.profile, "staging");
    }

    #[test]
    #[serial]
    fn test_profile_flag_wins_over_env() {
        let original = env::var("AWS_PROFILE").ok();
        unsafe {
            env::set_var("AWS_PROFILE", "staging");
        }

        let cli = parse(&["ssocreds", "-p", "dev", "export"]);

        unsafe {
            match original {
                Some(val) => env::set_var("AWS_PROFILE", val),
                None => env::remove_var("AWS_PROFILE"),
            }
        }
        assert_eq!(cli.profile, "dev");
    }

    #[test]
    fn test_no_command_defaults_to_export() {
        let cli = parse(&["ssocreds"]);
        assert!(cli.command.is_none());

        match cli
            .command
            .unwrap_or_else(|| Commands::Export(ExportCommand::default()))
        {
            Commands::Export(cmd) => assert_eq!(cmd.sso.account_id, None),
            _ => panic!("Expected Export command as default"),
        }
    }

    #[test]
    fn test_export_with_explicit_parameters() {
        let cli = parse(&[
            "ssocreds",
            "export",
            "--start-url",
            "https://corp.awsapps.com/start",
            "--account-id",
            "123456789012",
            "--region",
            "us-east-1",
            "--role-name",
            "Admin",
        ]);
        match cli.command {
            Some(Commands::Export(cmd)) => {
                assert_eq!(cmd.sso.account_id.as_deref(), Some("123456789012"));
                assert_eq!(cmd.sso.role_name.as_deref(), Some("Admin"));
                assert_eq!(cmd.sso.session, None);
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_save_target_short_flag() {
        let cli = parse(&["ssocreds", "save", "-t", "work"]);
        match cli.command {
            Some(Commands::Save(cmd)) => assert_eq!(cmd.target.as_deref(), Some("work")),
            _ => panic!("Expected Save command"),
        }
    }

    #[test]
    fn test_status_and_configure_parsing() {
        assert!(matches!(
            parse(&["ssocreds", "status"]).command,
            Some(Commands::Status(_))
        ));
        assert!(matches!(
            parse(&["ssocreds", "configure", "--session", "corp"]).command,
            Some(Commands::Configure(ConfigureCommand { session: Some(_), .. }))
        ));
    }

    #[test]
    fn test_completions_command_parsing() {
        let cli = parse(&["ssocreds", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions(_))));
    }

    #[test]
    fn test_command_structure_validation() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_invalid_command_fails() {
        assert!(Cli::try_parse_from(["ssocreds", "invalid"]).is_err());
    }

    #[test]
    fn test_help_flag_works() {
        let result = Cli::try_parse_from(["ssocreds", "--help"]);
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayHelp);
        } else {
            panic!("--help should short-circuit parsing");
        }
    }

    #[test]
    fn test_verbose_flag_multiple() {
        let cli = parse(&["ssocreds", "-vvv", "status"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_verbose_long_flag() {
        let cli = parse(&["ssocreds", "--verbose", "--verbose", "export"]);
        assert_eq!(cli.verbose, 2);
    }
}
