use crate::error::{Result, StatementExtractorError};
use crate::presenter::StatementTable;
use crate::schema::{ExtractionResult, ReportingBasis, StatementKind};
use chrono::NaiveDate;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const DEFAULT_PRINT_COMMAND: &str = "lp";

/// `{company name, whitespace runs as "_"}_{basis lowercase}.json`
pub fn export_file_name(result: &ExtractionResult, basis: ReportingBasis) -> String {
    let mut company = String::with_capacity(result.company_name.len());
    let mut in_whitespace = false;
    for c in result.company_name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                company.push('_');
            }
            in_whitespace = true;
        } else {
            company.push(c);
            in_whitespace = false;
        }
    }

    format!("{}_{}.json", company, basis.as_str().to_lowercase())
}

/// The whole result, all three statements, as pretty JSON.
pub fn export_json(result: &ExtractionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn write_export(dir: &Path, result: &ExtractionResult, basis: ReportingBasis) -> Result<PathBuf> {
    let path = dir.join(export_file_name(result, basis));
    std::fs::write(&path, export_json(result)?)?;
    info!("Exported {} statements to {}", basis, path.display());
    Ok(path)
}

/// Printable view: company header, then one statement or all of them.
pub fn render_report(
    result: &ExtractionResult,
    basis: ReportingBasis,
    only: Option<StatementKind>,
    generated_on: NaiveDate,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", result.company_name, basis));
    out.push_str(&format!("{}\n", result.reporting_period));

    let kinds: Vec<StatementKind> = match only {
        Some(kind) => vec![kind],
        None => StatementKind::ALL.to_vec(),
    };

    for kind in kinds {
        let table = StatementTable::from_statement(result.statement(kind));
        out.push_str(&format!("\n{} [{} Format]\n\n", table.title, basis));
        out.push_str(&table.render_text());
        out.push('\n');
    }

    out.push_str(&format!(
        "\nGenerated {}. Financial data extracted with AI assistance. Always verify with official reports.\n",
        generated_on.format("%Y-%m-%d")
    ));
    out
}

/// Hands `report` to the host print command on stdin.
pub fn print_report(report: &str, command: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| {
        StatementExtractorError::Configuration("print command is empty".to_string())
    })?;

    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn()?;

    // Closing stdin before waiting lets the command see end of input
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(report.as_bytes()),
        None => Ok(()),
    };

    // Reap the child even when it stopped reading early
    let status = child.wait()?;
    if !status.success() {
        return Err(StatementExtractorError::IoError(std::io::Error::other(format!(
            "print command '{}' exited with {}",
            command, status
        ))));
    }
    written?;
    info!("Sent report to '{}'", command);
    Ok(())
}
