mod args;
mod merge;

use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("main: args: {:?}", args);

    match merge::run_merge(&args) {
        Ok(summary) => {
            info!(
                "main: {} categories merged, {} failed",
                summary.succeeded.len(),
                summary.failed.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            for cause in ErrorCompat::iter_chain(&e).skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
