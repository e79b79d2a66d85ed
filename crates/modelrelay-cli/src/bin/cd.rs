use modelrelay_cli::cli::{exit_code, CdArgs};
use modelrelay_core::logging;

fn main() {
    // Log to stderr when the state dir is unusable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("log file unavailable: {:#}", err);
    }

    if let Err(err) = CdArgs::run_from_args() {
        tracing::error!("cd failed: {:#}", err);
        eprintln!("cd error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}
