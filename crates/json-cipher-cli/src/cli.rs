//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use json_cipher::Action;

/// Cipher and decipher the values of JSON files.
#[derive(Debug, Parser)]
#[command(name = "json-cipher", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (RUST_LOG still takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cipher JSON files (every primitive value becomes a hex token).
    Cipher(JobArgs),
    /// Decipher previously ciphered files back to plain JSON.
    Decipher(JobArgs),
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::Cipher(_) => Action::Cipher,
            Command::Decipher(_) => Action::Decipher,
        }
    }

    pub fn job(&self) -> &JobArgs {
        match self {
            Command::Cipher(job) | Command::Decipher(job) => job,
        }
    }
}

/// Arguments shared by both subcommands.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Target files, or directories walked recursively for matching files.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Secret key or password.
    #[arg(short, long, env = "JSON_CIPHER_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Target folder (files are written next to their source if unset).
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// File extension for ciphered JSON.
    #[arg(short = 'E', long, default_value = "cjson", value_name = "EXT")]
    pub ext: String,

    /// Cipher algorithm identifier.
    #[arg(long, default_value = "aes-256-ctr")]
    pub algo: String,

    /// Initialization vector length in bytes.
    #[arg(long, default_value_t = 16, value_name = "BYTES")]
    pub iv_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cipher_with_defaults() {
        let cli = Cli::try_parse_from([
            "json-cipher",
            "cipher",
            "data.json",
            "--secret",
            "My secret password",
        ])
        .unwrap();

        assert_eq!(cli.command.action(), Action::Cipher);
        let job = cli.command.job();
        assert_eq!(job.paths, vec![PathBuf::from("data.json")]);
        assert_eq!(job.ext, "cjson");
        assert_eq!(job.algo, "aes-256-ctr");
        assert_eq!(job.iv_length, 16);
        assert!(job.dest.is_none());
    }

    #[test]
    fn parses_decipher_with_dest_and_ext() {
        let cli = Cli::try_parse_from([
            "json-cipher",
            "decipher",
            "a.cjson",
            "b.cjson",
            "--secret",
            "s",
            "--dest",
            "out",
            "-E",
            ".enc",
        ])
        .unwrap();

        assert_eq!(cli.command.action(), Action::Decipher);
        let job = cli.command.job();
        assert_eq!(job.paths.len(), 2);
        assert_eq!(job.dest.as_deref(), Some(std::path::Path::new("out")));
        assert_eq!(job.ext, ".enc");
    }

    #[test]
    fn requires_at_least_one_path() {
        let res = Cli::try_parse_from(["json-cipher", "cipher", "--secret", "s"]);
        assert!(res.is_err());
    }
}
