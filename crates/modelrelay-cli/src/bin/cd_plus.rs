use modelrelay_cli::cli::{exit_code, CdPlusArgs};
use modelrelay_core::logging;

fn main() {
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable: {:#}", err);
    }

    if let Err(err) = CdPlusArgs::run_from_args() {
        tracing::error!("cd_plus failed: {:#}", err);
        eprintln!("cd_plus error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}
