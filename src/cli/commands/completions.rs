//! `pass-git-helper completions`: generate shell completion scripts.
//!
//! Usage:
//!   pass-git-helper completions bash > ~/.bash_completion.d/pass-git-helper
//!   pass-git-helper completions zsh

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    write_completions(shell, &mut io::stdout())
}

fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pass-git-helper", out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_completions_mention_actions() {
        let mut out = Vec::new();
        write_completions(Shell::Bash, &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("pass-git-helper"));
        assert!(script.contains("get"));
        assert!(script.contains("--mapping"));
    }

    #[test]
    fn every_shell_generates_something() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            let mut out = Vec::new();
            write_completions(shell, &mut out).unwrap();
            assert!(!out.is_empty());
        }
    }
}
