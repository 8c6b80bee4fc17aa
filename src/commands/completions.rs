use clap::{Args, CommandFactory};
use clap_complete::Shell;
use std::io::{self, Write};

use crate::cli::Cli;

#[derive(Debug, Clone, Args)]
pub struct CompletionsCommand {
    #[arg(value_enum, help = "Target shell for completion script")]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn execute(self) {
        self.write_to(&mut io::stdout());
    }

    fn write_to(&self, out: &mut dyn Write) {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        clap_complete::generate(self.shell, &mut cmd, bin_name, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buffer = Vec::new();
        CompletionsCommand { shell }.write_to(&mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_shell_specific_markers() {
        let cases = [
            (Shell::Bash, "complete -F _ssocreds"),
            (Shell::Zsh, "#compdef ssocreds"),
            (Shell::Fish, "complete -c ssocreds"),
            (Shell::PowerShell, "-CommandName 'ssocreds'"),
        ];

        for (shell, marker) in cases {
            let result = script(shell);
            assert!(
                result.contains(marker),
                "Expected '{marker}' in {shell} completion script"
            );
        }
    }

    #[test]
    fn test_completion_contains_subcommands_and_globals() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let result = script(shell);
            for word in ["export", "save", "status", "configure", "completions", "profile"] {
                assert!(
                    result.contains(word),
                    "'{word}' should be in {shell} completions"
                );
            }
        }
    }
}
