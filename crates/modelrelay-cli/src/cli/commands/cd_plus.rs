//! `cd_plus <address> <token> <key> <repo> [dir]`: download, then relay to the Hub.

use anyhow::Result;
use modelrelay_core::config::RelayConfig;
use modelrelay_core::http::HttpClient;
use modelrelay_core::pipeline::{Pipeline, TransferRequest};
use modelrelay_core::upload::{RepoTarget, UploadTarget};

use super::cd::print_local;
use crate::cli::progress::ProgressPrinter;
use crate::cli::{destination_or_cwd, CdPlusArgs};

pub fn run_cd_plus(cfg: &RelayConfig, args: CdPlusArgs) -> Result<()> {
    let repo = RepoTarget::new(
        &args.repo_id,
        args.repo_type.unwrap_or(cfg.target.repo_type),
        args.revision.as_deref().unwrap_or(&cfg.target.revision),
    )?;
    tracing::debug!(repo = %repo.repo_id(), revision = %repo.revision, "upload target");

    let request = TransferRequest {
        source: args.address,
        destination_dir: destination_or_cwd(args.destination)?,
        source_api_key: Some(args.api_key).filter(|k| !k.is_empty()),
        with_sidecars: cfg.sidecars,
        upload: Some(UploadTarget {
            repo,
            token: args.upload_token,
        }),
    };
    let client = HttpClient::new(cfg.http.clone());
    let mut printer = ProgressPrinter::new();
    let result = Pipeline::new(&client, cfg).run(&request, &mut |p| printer.update(p));
    printer.finish();
    let report = result?;

    print_local(&report);
    for path in &report.sidecars {
        println!("  + {}", path.display());
    }
    if let Some(outcome) = &report.upload {
        if outcome.objects.is_empty() {
            println!("Nothing uploaded (all files ignored by the repository).");
        }
        for object in &outcome.objects {
            println!("Uploaded {} -> {}", object.path_in_repo, object.location);
        }
        if let Some(url) = &outcome.commit_url {
            println!("Commit: {}", url);
        }
    }
    Ok(())
}
