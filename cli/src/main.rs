// Copyright (c) 2026 Quill Contributors. MIT License.
// See LICENSE for details.

//! # Quill CLI
//!
//! Entry point for the `quill` binary. Loads the client config, applies
//! flag and environment overrides, initializes logging, and runs one
//! subcommand against the configured node:
//!
//! - `transfer` : single system-contract transfer
//! - `push`     : sign and push a transaction given as JSON
//! - `actions`  : list a contract's ABI
//! - `keygen`   : generate key pairs offline
//! - `info`     : head-of-chain summary
//! - `version`  : build version information
//!
//! Results are printed to stdout as pretty JSON. Logs go to stderr.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use quill_client::compose::{ComposeResult, Composer, StaticKeys, TransactionInput};
use quill_client::crypto::PrivateKey;
use quill_client::{ClientConfig, HttpChain};
use quill_contracts::{with_native_abi, NativeContract, Transfer};

use cli::{Commands, QuillCli, SigningArgs};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = QuillCli::parse();

    // Offline commands need neither config nor logging.
    match &cli.command {
        Commands::Version => {
            print_version();
            return Ok(());
        }
        Commands::Keygen(args) => return keygen(args.count),
        _ => {}
    }

    let config = load_config(
        cli.config.as_deref(),
        cli.endpoint.as_deref(),
        cli.log_format.as_deref(),
    )?;
    logging::init_logging(&config.log.level, LogFormat::from_str_lossy(&config.log.format));
    tracing::debug!(endpoint = %config.endpoint, "configuration loaded");

    match cli.command {
        Commands::Transfer(args) => {
            let composer = build_composer(&config, &args.signing)?;
            let transfer = Transfer::new(args.from, args.to, args.amount).memo(args.memo);
            let result = composer
                .transfer(transfer, args.signing.options())
                .await
                .context("transfer failed")?;
            print_result(&result)
        }
        Commands::Push(args) => {
            let composer = build_composer(&config, &args.signing)?;
            let input = read_transaction(&args.file)?;
            let result = composer
                .push_transaction(input, args.signing.options())
                .await
                .context("push failed")?;
            print_result(&result)
        }
        Commands::Actions(args) => {
            let composer = build_composer(&config, &SigningArgs::default())?;
            let proxy = composer
                .contract(&args.contract)
                .await
                .with_context(|| format!("failed to load contract '{}'", args.contract))?;
            for action in &proxy.abi().actions {
                let fields: Vec<String> = action
                    .fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.type_name))
                    .collect();
                println!("{}({})", action.name, fields.join(", "));
            }
            Ok(())
        }
        Commands::Info => {
            let composer = build_composer(&config, &SigningArgs::default())?;
            let info = composer.get_info().await.context("get_info failed")?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Commands::Version | Commands::Keygen(_) => Ok(()),
    }
}

/// Read the config file if one was given, then apply overrides.
fn load_config(
    path: Option<&Path>,
    endpoint: Option<&str>,
    log_format: Option<&str>,
) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    if let Some(format) = log_format {
        config.log.format = format.to_string();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_composer(config: &ClientConfig, signing: &SigningArgs) -> Result<Composer> {
    let chain = HttpChain::from_config(config)
        .with_context(|| format!("failed to create client for {}", config.endpoint))?;

    let mut builder =
        with_native_abi(Composer::builder(Arc::new(chain))).config(config.composer.clone());
    if !signing.private_keys.is_empty() {
        builder = builder.key_provider(StaticKeys::new(signing.private_keys.clone()));
    }
    Ok(builder.build())
}

/// Parse a transaction literal from `path`, or stdin when `path` is `-`.
fn read_transaction(path: &Path) -> Result<TransactionInput> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read transaction from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    let value: serde_json::Value =
        serde_json::from_str(&content).context("transaction is not valid JSON")?;
    Ok(TransactionInput::from_json(&value)?)
}

fn print_result(result: &ComposeResult) -> Result<()> {
    tracing::info!(
        id = %result.transaction_id,
        broadcast = result.broadcast,
        signatures = result.transaction.signatures.len(),
        "done"
    );
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn keygen(count: usize) -> Result<()> {
    let keys: Vec<serde_json::Value> = (0..count)
        .map(|_| {
            let key = PrivateKey::generate();
            serde_json::json!({
                "private_key": key.to_encoded(),
                "public_key": key.public_key().to_string(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&keys)?);
    Ok(())
}

fn print_version() {
    println!("quill {}", env!("CARGO_PKG_VERSION"));
    println!("rustc {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}
