//! Command lines of `cd` and `cd_plus`.

mod commands;
pub mod progress;

use anyhow::Result;
use clap::Parser;
use modelrelay_core::config;
use modelrelay_core::upload::RepoType;
use modelrelay_core::TransferError;
use std::path::PathBuf;

use commands::{run_cd, run_cd_plus};

/// Download a model from a page or file address.
#[derive(Debug, Parser)]
#[command(name = "cd")]
#[command(about = "Resolve a model address and download the file", long_about = None)]
pub struct CdArgs {
    /// Model page URL (e.g. https://civitai.com/models/4201) or direct file URL.
    pub address: String,

    /// Directory to save into (default: current directory).
    pub destination: Option<PathBuf>,

    /// Source-site API key; overrides `source.api_key` from the config file.
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// Download a model and relay it into a Hub repository.
#[derive(Debug, Parser)]
#[command(name = "cd_plus")]
#[command(
    about = "Download a model and upload it (with metadata) to a Hub repository",
    long_about = None
)]
pub struct CdPlusArgs {
    /// Direct file URL or model page URL.
    pub address: String,

    /// Hub access token with write permission.
    pub upload_token: String,

    /// Source-site API key.
    pub api_key: String,

    /// Target repository, `owner/name`.
    pub repo_id: String,

    /// Directory to save into (default: current directory).
    pub destination: Option<PathBuf>,

    /// Repository type: model, dataset or space (default from config).
    #[arg(long, value_name = "TYPE")]
    pub repo_type: Option<RepoType>,

    /// Branch or ref to commit to (default from config).
    #[arg(long, value_name = "REV")]
    pub revision: Option<String>,
}

impl CdArgs {
    pub fn run_from_args() -> Result<()> {
        let args = Self::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        run_cd(&cfg, args)
    }
}

impl CdPlusArgs {
    pub fn run_from_args() -> Result<()> {
        let args = Self::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        run_cd_plus(&cfg, args)
    }
}

/// Process exit status for a failed run: the transfer error's own code, else 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<TransferError>()
        .map_or(1, TransferError::exit_code)
}

fn destination_or_cwd(destination: Option<PathBuf>) -> Result<PathBuf> {
    match destination {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

#[cfg(test)]
mod tests;
