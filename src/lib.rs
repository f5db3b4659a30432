//! dupsweep - duplicate file detection and safe deletion
//!
//! Files under a root are grouped by size, then (in strict mode) by a
//! 256-bit content digest computed on a bounded thread pool. Unwanted
//! copies are moved to the system trash, never unlinked.
//!
//! The async boundary lives in [`service::DedupService`]:
//!
//! ```no_run
//! use dupsweep::duplicates::ScanMode;
//! use dupsweep::service::DedupService;
//!
//! # async fn demo() -> Result<(), String> {
//! let service = DedupService::default();
//! let groups = service.scan_folder("/data/photos".into(), ScanMode::Strict).await?;
//! if let Some(group) = groups.first() {
//!     let extra: Vec<String> = group.files[1..].iter().map(|f| f.path.clone()).collect();
//!     let result = service.delete_files(extra).await?;
//!     println!("{} moved to trash, {} failed", result.deleted.len(), result.failed.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod service;
pub mod signal;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::DirectoryTrash;
use crate::cli::{Cli, Commands, DeleteArgs, OutputFormat, PreviewArgs, ScanArgs};
use crate::config::Settings;
use crate::coordinator::ScanCoordinator;
use crate::error::ExitCode;
use crate::output::{write_json, JsonOutput, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::service::DedupService;

/// Run the CLI application, writing reports to stdout.
///
/// # Errors
///
/// Returns an error if configuration fails to load, the runtime cannot
/// start, the scan root is unusable, or the scan is cancelled.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    run_app_with_output(cli, &mut io::stdout().lock())
}

/// Run the CLI application, writing reports to `out`.
///
/// # Errors
///
/// Same as [`run_app`], plus failures writing to `out`.
pub fn run_app_with_output(cli: Cli, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Commands::Scan(args) => {
            args.apply_to(&mut settings.scan);
            runtime.block_on(run_scan(&args, &settings, cli.quiet, out))
        }
        Commands::Preview(args) => runtime.block_on(run_preview(&args, &settings, out)),
        Commands::Delete(args) => runtime.block_on(run_delete(&args, out)),
    }
}

async fn run_scan(
    args: &ScanArgs,
    settings: &Settings,
    quiet: bool,
    out: &mut dyn Write,
) -> anyhow::Result<ExitCode> {
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(quiet));
    let coordinator =
        ScanCoordinator::new(settings.scan.finder_config()).with_progress_callback(progress);

    match signal::install_handler() {
        Ok(handler) => {
            let target = coordinator.clone();
            handler.on_shutdown(move || {
                target.cancel();
            });
        }
        Err(e) => log::warn!("{e}; Ctrl+C will not cancel the scan cleanly"),
    }

    log::info!(
        "Scanning {} ({} mode)",
        args.path.display(),
        settings.scan.mode
    );
    let (groups, summary) = coordinator
        .scan_with_summary(args.path.clone(), settings.scan.mode)
        .await
        .with_context(|| format!("Scan of {} failed", args.path.display()))?;

    match args.output {
        OutputFormat::Text => TextOutput::new(&groups, &summary).write_to(&mut *out)?,
        OutputFormat::Json => JsonOutput::new(&groups).write_to(&mut *out)?,
    }

    Ok(if summary.had_errors() {
        ExitCode::PartialSuccess
    } else if groups.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    })
}

async fn run_preview(
    args: &PreviewArgs,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<ExitCode> {
    let service = DedupService::default().with_preview_config(settings.preview.clone());
    let preview = service
        .get_file_preview(path_arg(&args.path))
        .await
        .map_err(anyhow::Error::msg)?;

    write_json(out, &preview)?;
    Ok(ExitCode::Success)
}

async fn run_delete(args: &DeleteArgs, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
    let mut service = DedupService::default();
    if let Some(dir) = &args.trash_dir {
        let trash = DirectoryTrash::new(dir.clone())
            .with_context(|| format!("Cannot use trash directory {}", dir.display()))?;
        service = service.with_trash(Arc::new(trash));
    }

    let paths = args.paths.iter().map(|p| path_arg(p)).collect();
    let result = service.delete_files(paths).await.map_err(anyhow::Error::msg)?;

    for failure in &result.failed {
        log::warn!("Could not delete {}: {}", failure.path, failure.error);
    }
    write_json(out, &result)?;

    Ok(if result.failed.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

/// Absolute form of a user-supplied path, as the boundary expects.
fn path_arg(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .into_owned()
}
