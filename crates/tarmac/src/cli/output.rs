//! Output formatting utilities

use console::style;

use tarmac_core::{ArtifactTracker, TarmacError};

use crate::pipeline::PipelineReport;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Human-readable summary of a finished run
pub fn report(report: &PipelineReport) {
    if report.dry_run {
        info("Dry run: mutating commands were logged, not executed");
    }
    println!("{}", key_value("Tag", &style(&report.tag).yellow().to_string()));
    println!(
        "{}",
        key_value(
            "Version",
            &format!("{} ({})", report.version.marketing_version, report.version.build_number)
        )
    );
    for record in report.artifacts.all() {
        println!(
            "{}",
            key_value(&record.description, &style(record.path.display()).cyan().to_string())
        );
    }
    if report.dry_run && !report.artifacts.is_empty() {
        println!("{}", attachments_preview(&report.artifacts));
    }
    if report.notes_truncated == Some(true) {
        info("Release notes were truncated; the full notes are attached");
    }
    if !report.published {
        info("No release summary given, release not published");
    }
    success(&released_line(report.release_type));
}

/// Completion line for `--format json`; stdout carries only the JSON document
pub fn released(release_type: &str) {
    eprintln!("{} {}", style("✓").green().bold(), released_line(release_type));
}

fn released_line(release_type: &str) -> String {
    format!("Released: {}", release_type)
}

/// The files a real run would attach, quoted the way a shell would take them
fn attachments_preview(artifacts: &ArtifactTracker) -> String {
    key_value("Attachments", &artifacts.render_as_quoted_list())
}

/// Print a failed run: stage, error chain and any captured tool output
pub fn failure(err: &anyhow::Error) {
    let Some(tarmac) = err.downcast_ref::<TarmacError>() else {
        error(&format!("{:#}", err));
        return;
    };

    match tarmac.stage() {
        Some(stage) => error(&format!("Stage '{}' failed", stage)),
        None => error("Release failed"),
    }
    let root = tarmac.root();
    eprintln!("  {}", root);

    let mut source = std::error::Error::source(root);
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }

    if let TarmacError::Tool(tool) = root {
        for (name, captured) in [("stdout", tool.stdout()), ("stderr", tool.stderr())] {
            match captured {
                Some(text) if !text.trim().is_empty() => {
                    eprintln!("{}", style(format!("--- {} ---", name)).dim());
                    eprintln!("{}", text.trim_end());
                }
                _ => {}
            }
        }
    }
}
