//! # CLI Interface
//!
//! `clap` derive definitions for the `quill` binary. Global options select
//! the config file and node; signing options are shared by the commands
//! that produce transactions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use quill_client::compose::ComposeOptions;
use quill_contracts::SYSTEM_CONTRACT;

/// Compose, sign and push transactions to a Quill node.
#[derive(Parser, Debug)]
#[command(
    name = "quill",
    about = "Compose, sign and push Quill transactions",
    version,
    propagate_version = true
)]
pub struct QuillCli {
    /// Path to a TOML client config. Defaults apply when omitted.
    #[arg(long, short = 'c', env = "QUILL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Node base URL. Overrides `endpoint` from the config file.
    #[arg(long, short = 'u', env = "QUILL_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Log format: `pretty` or `json`. Overrides the config file.
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transfer tokens with the system contract.
    Transfer(TransferArgs),
    /// Sign and push a transaction read from a JSON file (`-` for stdin).
    Push(PushArgs),
    /// List a contract's actions and their fields.
    Actions(ActionsArgs),
    /// Generate new key pairs.
    Keygen(KeygenArgs),
    /// Print the node's head-of-chain summary.
    Info,
    /// Print version information and exit.
    Version,
}

/// Key material and what to do with the composed transaction.
#[derive(Args, Debug, Default)]
pub struct SigningArgs {
    /// Private keys to sign with, comma separated.
    ///
    /// Prefer the environment variable over the flag so keys stay out of
    /// shell history.
    #[arg(
        long = "private-key",
        env = "QUILL_PRIVATE_KEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub private_keys: Vec<String>,

    /// Sign but do not broadcast. The signed transaction is printed.
    #[arg(long)]
    pub skip_broadcast: bool,

    /// Neither sign nor broadcast. No node call is made and keys are
    /// ignored.
    #[arg(long)]
    pub skip_sign: bool,
}

impl SigningArgs {
    pub fn options(&self) -> ComposeOptions {
        if self.skip_sign {
            ComposeOptions::default()
                .with_sign(false)
                .with_broadcast(false)
        } else {
            ComposeOptions::default().with_broadcast(!self.skip_broadcast)
        }
    }
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    pub from: String,
    pub to: String,
    pub amount: u64,

    #[arg(long, default_value = "")]
    pub memo: String,

    #[command(flatten)]
    pub signing: SigningArgs,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// JSON file holding `{"scope": [...], "messages": [...]}`.
    pub file: PathBuf,

    #[command(flatten)]
    pub signing: SigningArgs,
}

#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Contract account whose ABI to list.
    #[arg(default_value = SYSTEM_CONTRACT)]
    pub contract: String,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}
