//! Shared driver of rm, mv and cp
//!
//! Paths are made absolute locally, then resolved, submitted and polled by
//! the batch coordinator. Processed paths are printed first, failures after.

use pan_core::{BatchReport, BatchState, BatchTaskKind, Result};
use serde::Serialize;

use super::context::Context;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// JSON shape of a batch command's result
#[derive(Debug, Serialize)]
pub(crate) struct BatchOutput<'a> {
    status: &'static str,
    #[serde(flatten)]
    report: &'a BatchReport,
}

impl<'a> BatchOutput<'a> {
    pub fn new(report: &'a BatchReport) -> Self {
        Self {
            status: status(report),
            report,
        }
    }
}

fn status(report: &BatchReport) -> &'static str {
    match report.state {
        BatchState::TimedOut => "timed_out",
        _ if report.is_success() => "success",
        _ if report.succeeded.is_empty() => "failed",
        _ => "partial",
    }
}

/// Run one bulk operation and print its report
pub(crate) async fn run(
    kind: BatchTaskKind,
    sources: &[String],
    target: Option<&str>,
    family: i64,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let ctx = match Context::load_or_report(family, &formatter) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let mut paths = Vec::with_capacity(sources.len());
    for source in sources {
        match ctx.absolute(source) {
            Ok(path) => paths.push(path.to_string()),
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::UsageError;
            }
        }
    }

    let running = running_message(kind, paths.len());
    let spinner = ProgressBar::spinner(formatter.config(), first_message(target, &running));
    let target = match target {
        Some(input) => match ctx.resolve(input).await {
            Ok(resolved) => {
                spinner.set_message(&running);
                Some(resolved)
            }
            Err(e) => {
                spinner.finish_and_clear();
                formatter.error(&format!("Target {input}: {e}"));
                return ExitCode::from(&e);
            }
        },
        None => None,
    };

    let coordinator = ctx.coordinator();
    let outcome = match &target {
        Some((_, folder)) => {
            interruptible(coordinator.run_to(kind, &paths, folder, ctx.scope)).await
        }
        None => interruptible(coordinator.run(kind, &paths, ctx.scope)).await,
    };
    spinner.finish_and_clear();

    let report = match outcome {
        Some(Ok(report)) => report,
        Some(Err(e)) => {
            formatter.error(&format!("The {kind} task failed: {e}"));
            return ExitCode::from(&e);
        }
        None => {
            formatter.warning("Interrupted, a submitted task keeps running on the service");
            return ExitCode::Interrupted;
        }
    };

    let target_path = target.as_ref().map(|(path, _)| path.to_string());
    print_report(&report, target_path.as_deref(), &formatter);

    ExitCode::for_report(&report)
}

fn running_message(kind: BatchTaskKind, count: usize) -> String {
    format!("Running {kind} of {count} path(s)")
}

/// rm has no target folder to resolve
fn first_message<'a>(target: Option<&str>, running: &'a str) -> &'a str {
    match target {
        Some(_) => "Resolving target folder",
        None => running,
    }
}

/// Stop waiting on Ctrl+C
async fn interruptible<F>(operation: F) -> Option<Result<BatchReport>>
where
    F: Future<Output = Result<BatchReport>>,
{
    tokio::select! {
        result = operation => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    }
}

fn print_report(report: &BatchReport, target: Option<&str>, formatter: &Formatter) {
    if formatter.is_json() {
        formatter.json(&BatchOutput::new(report));
        return;
    }

    if !report.succeeded.is_empty() {
        let mut table = formatter.table(&["#", "PATH", "TYPE"]);
        for (index, item) in report.succeeded.iter().enumerate() {
            let kind = if item.is_folder { "folder" } else { "file" };
            table.add_row(vec![(index + 1).to_string(), item.path.clone(), kind.into()]);
        }
        formatter.print_table(&table);
        formatter.success(&summary(report, target));
    }

    for failure in &report.failed_to_resolve {
        formatter.path_error(&failure.path, &failure.reason);
    }
    for failure in &report.failed_remotely {
        formatter.path_error(&failure.path, &failure.reason);
    }

    if report.state == BatchState::TimedOut
        && let Some(task_id) = &report.task_id
    {
        formatter.warning(&format!(
            "Task {task_id} did not finish in time and may still complete on the service"
        ));
    }
}

fn summary(report: &BatchReport, target: Option<&str>) -> String {
    let count = report.succeeded.len();
    match (report.kind, target) {
        (BatchTaskKind::Delete, _) => {
            format!("Removed {count} item(s), they can be restored from the recycle bin")
        }
        (BatchTaskKind::Move, Some(target)) => format!("Moved {count} item(s) to {target}"),
        (BatchTaskKind::Copy, Some(target)) => format!("Copied {count} item(s) to {target}"),
        (kind, None) => format!("{kind}: {count} item(s) done"),
    }
}
