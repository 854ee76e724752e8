//! JSON output of extracted records.

use crate::error::RustyPlanError;
use crate::table::record::Record;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

/// Path of the JSON file written for `document` into `output_dir`: `<basename>.json`.
pub fn output_path(document: &Path, output_dir: &Path) -> PathBuf {
    let base_name = document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{base_name}.json"))
}

/// Writes `records` as a four-space indented UTF-8 JSON array.
///
/// # Arguments
/// * `records` - Records of one document, never empty
/// * `document` - Source document, naming the output file
/// * `output_dir` - Existing directory the file is written into
///
/// # Returns
/// * `Result<PathBuf, RustyPlanError>` - Path of the written file; `EmptyResult` when there is nothing to write
pub fn write_records(records: &[Record], document: &Path, output_dir: &Path) -> Result<PathBuf, RustyPlanError> {
    if records.is_empty() {
        Err(RustyPlanError::EmptyResult(document.display().to_string()))?
    }

    let path = output_path(document, output_dir);
    let mut writer = BufWriter::new(File::create(&path)?);
    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    writer.flush()?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(path)
}
