//! Shell completion generation for export
//!
//! This module provides functionality to generate shell completion scripts
//! for bash, zsh, fish, PowerShell and elvish.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

/// Binary name the completions are registered for
const BIN_NAME: &str = "export";

/// Generate shell completion script on stdout
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish, powershell, elvish)
///
/// # Returns
/// * `Result<()>` - Success or error
pub fn generate_completion(shell_name: &str) -> Result<()> {
    let script = render_completion(shell_name)?;
    io::stdout().write_all(&script)?;
    Ok(())
}

/// Render the completion script for a shell
pub fn render_completion(shell_name: &str) -> Result<Vec<u8>> {
    let shell = parse_shell(shell_name)?;
    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    Ok(buffer)
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "pwsh" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(ConfigError::Generic(format!(
            "Unsupported shell: {shell_name}. Supported shells: bash, zsh, fish, powershell, elvish"
        ))
        .into()),
    }
}
