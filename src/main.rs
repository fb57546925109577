#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod error;
mod lock;
mod prelude;
mod quantity;
mod tables;

use std::{process::ExitCode, time::Duration};

use clap::{Parser, crate_version};

use crate::{
    cli::Args,
    core::cycle::{ReportSink, run_exclusively},
    lock::LockFile,
    prelude::*,
    tables::DryRun,
};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    if let Err(error) = args.logging.init() {
        eprintln!("failed to initialize logging: {error:#}");
        return ExitCode::FAILURE;
    }
    info!(version = crate_version!(), "starting…");

    match relay(args) {
        Ok(()) => {
            info!("done!");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn relay(args: Args) -> Result {
    let timeout: Duration = args.http_timeout.into();
    let source = args.fronius.new_client(timeout);
    let settings = args.report.settings();
    let lock_file = LockFile::new(args.lock_file);
    debug!(lock_file = %lock_file.path().display(), ?settings, "configured");

    let sink: Box<dyn ReportSink> =
        if args.dry_run { Box::new(DryRun) } else { Box::new(args.pvoutput.new_client(timeout)?) };
    if let Some(report) = run_exclusively(&lock_file, &source, &*sink, &settings)? {
        debug!(?report, "sent");
    }
    Ok(())
}
