//! Completions command implementation
//!
//! Handles the `asset-slim completions` command which generates shell
//! completion scripts for bash, zsh, fish, etc.

use clap_complete::{generate, Shell};

/// Generate shell completion scripts
///
/// Outputs the completion script for the specified shell to stdout. Users
/// can redirect this to their shell's completion directory.
///
/// # Examples
///
/// ```bash
/// # Bash
/// asset-slim completions bash > /etc/bash_completion.d/asset-slim
///
/// # Zsh
/// asset-slim completions zsh > ~/.zfunc/_asset-slim
/// ```
pub fn cmd_completions(shell: Shell) {
    // The Cli struct lives in main.rs, so the command tree is re-created
    // here with the builder API for completion generation.
    use clap::{Arg, ArgAction, Command};

    let mut cmd = Command::new("asset-slim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mobile app asset optimizer")
        .arg(Arg::new("root").help("Asset root directory"))
        .arg(
            Arg::new("no-emoji")
                .long("no-emoji")
                .help("Disable emoji output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the final report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .help("Worker threads for the optimization phases"),
        )
        .subcommand(Command::new("completions").about("Generate shell completions"));

    let bin_name = "asset-slim".to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
