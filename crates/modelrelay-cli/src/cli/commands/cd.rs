//! `cd <address> [dir]`: resolve and download.

use anyhow::Result;
use modelrelay_core::config::RelayConfig;
use modelrelay_core::http::HttpClient;
use modelrelay_core::pipeline::{Pipeline, TransferReport, TransferRequest};

use crate::cli::progress::{human_size, ProgressPrinter};
use crate::cli::{destination_or_cwd, CdArgs};

pub fn run_cd(cfg: &RelayConfig, args: CdArgs) -> Result<()> {
    let request = TransferRequest {
        source: args.address,
        destination_dir: destination_or_cwd(args.destination)?,
        source_api_key: args.api_key,
        with_sidecars: false,
        upload: None,
    };
    let client = HttpClient::new(cfg.http.clone());
    let mut printer = ProgressPrinter::new();
    let result = Pipeline::new(&client, cfg).run(&request, &mut |p| printer.update(p));
    printer.finish();
    print_local(&result?);
    Ok(())
}

pub(super) fn print_local(report: &TransferReport) {
    if report.skipped_existing {
        println!(
            "Already present: {} ({})",
            report.local_path.display(),
            human_size(report.bytes)
        );
    } else {
        println!(
            "Saved {} ({})",
            report.local_path.display(),
            human_size(report.bytes)
        );
    }
}
