//! One document, start to finish: file name metadata, grid, walk, JSON.

use crate::error::ErrorKind;
use crate::error::RustyPlanError;
use crate::notify::Notifier;
use crate::notify::Severity;
use crate::output::write_records;
use crate::spreadsheet::GridSource;
use crate::table::record::Metadata;
use crate::table::record::RecordContext;
use crate::table::schema::Schema;
use crate::table::walker::TableWalker;
use chrono::Local;
use std::path::Path;
use std::path::PathBuf;
use tracing::error;
use tracing::info;

/// Collaborators and options shared by every run.
pub struct Context {
    pub schema: Schema,
    pub grid_source: Box<dyn GridSource>,
    pub notifier: Box<dyn Notifier>,
    pub header_threshold: u8,
}

/// Why a document produced no output.
#[derive(Clone, Debug, PartialEq)]
pub struct RunFailure {
    pub kind: ErrorKind,
    /// Base name of the document
    pub document: String,
    /// 1-based sheet row, for row failures
    pub row: Option<usize>,
    /// Short code for the calling batch driver
    pub signal: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Success { output: PathBuf, records: usize },
    Failure(RunFailure),
}

impl RunOutcome {
    /// Process exit status: 0 on success, the failure kind's code otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success { .. } => 0,
            RunOutcome::Failure(failure) => failure.kind.exit_code(),
        }
    }
}

/// Interprets `document` and writes its records into `output_dir`.
/// Every failure is logged and sent to the notifier before it is returned.
pub fn run(document: &Path, output_dir: &Path, context: &mut Context) -> RunOutcome {
    let base_name = base_name(document);
    info!("{} has started processing", base_name);
    match process(document, &base_name, output_dir, context) {
        Ok((output, records)) => {
            info!("{} has finished processing: {} records", base_name, records);
            context
                .notifier
                .notify(Severity::Info, &format!("File {} processed: {} records", base_name, records));
            RunOutcome::Success { output, records }
        }
        Err(e) => {
            let failure = RunFailure {
                kind: e.kind(),
                document: base_name.to_owned(),
                row: e.row(),
                signal: e.signal(),
                message: e.to_string(),
            };
            error!(document = %failure.document, kind = ?failure.kind, signal = %failure.signal, "{}", failure.message);
            context.notifier.notify(Severity::Error, &operator_message(&failure));
            RunOutcome::Failure(failure)
        }
    }
}

fn process(document: &Path, base_name: &str, output_dir: &Path, context: &mut Context) -> Result<(PathBuf, usize), RustyPlanError> {
    let metadata = Metadata::from_file_name(base_name, &context.schema.departments)?;
    info!("{} belongs to {} of {}", base_name, metadata.department, metadata.year);

    let grid = context.grid_source.read_grid(document, &context.schema.sheet_names)?;
    let record_context = RecordContext {
        metadata,
        file_name: base_name.to_owned(),
        parsed_on: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    let mut walker = TableWalker::new(&context.schema, context.header_threshold)?;
    let records = walker.walk(&grid, &record_context)?;
    let output = write_records(&records, document, output_dir)?;
    Ok((output, records.len()))
}

fn base_name(document: &Path) -> String {
    document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.display().to_string())
}

/// Text sent to operators for a failed document.
fn operator_message(failure: &RunFailure) -> String {
    match failure.row {
        Some(row) => format!("Error in row {} of file {}: {}", row, failure.document, failure.message),
        None => format!("Error processing file {} ({}): {}", failure.document, failure.signal, failure.message),
    }
}
