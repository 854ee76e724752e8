//! Workbook reading: turns one sheet of an Office Open XML workbook into a [`Grid`].

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::ResultMessage;
use crate::error::RustyPlanError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::table::grid::Grid;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors specific to workbook reading
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("No sheet matching '{0}' in workbook")]
    SheetNotFound(String),

    #[error("Unsupported workbook format: {0}")]
    UnsupportedFormat(String),

    #[error("Workbook part '{0}' is missing")]
    FileError(String),

    #[error("Workbook '{0}' has no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Invalid value in cell {0}: {1}")]
    CellValueError(String, String),
}

/// A workbook whose sheets can be read one at a time.
pub(crate) trait Spreadsheet {
    /// Returns the file name of this workbook
    fn name(&self) -> String;

    /// Lists the sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Loads the shared string table referenced by `SharedString` cells
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyPlanError>;

    /// Reads the cells of one sheet
    fn read_sheet(&mut self, sheet_name: &str, criteria: &Criteria) -> Result<Sheet, RustyPlanError>;
}

/// Opens a workbook, choosing the reader by file extension
///
/// # Arguments
/// * `file_name` - Path to the workbook
///
/// # Returns
/// * `Result<Box<dyn Spreadsheet>, RustyPlanError>` - The opened workbook
pub(crate) fn open_spreadsheet(file_name: &str) -> Result<Box<dyn Spreadsheet>, RustyPlanError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlam" => {
            let spreadsheet: Box<dyn Spreadsheet> = Box::new(XlsxSpreadsheet::open(file_name)?);
            Ok(spreadsheet)
        }
        _ => Err(SpreadsheetError::UnsupportedFormat(file_name.to_owned()).into()),
    }
}

/// Supplies the cell grid of the one sheet a document is interpreted from.
pub trait GridSource {
    /// Reads the single sheet of `document` whose name matches one of `sheet_names`.
    fn read_grid(&mut self, document: &Path, sheet_names: &[String]) -> Result<Grid, RustyPlanError>;
}

/// Grid source backed by workbook files on disk.
#[derive(Clone, Debug, Default)]
pub struct WorkbookGridSource {
    /// Error cells read as blank instead of their error code
    pub error_as_null: bool,
}

impl WorkbookGridSource {
    pub fn new(error_as_null: bool) -> Self {
        Self { error_as_null }
    }
}

impl GridSource for WorkbookGridSource {
    fn read_grid(&mut self, document: &Path, sheet_names: &[String]) -> Result<Grid, RustyPlanError> {
        let file_name = document.to_string_lossy();
        let mut spreadsheet = open_spreadsheet(&file_name).with_prefix(&file_name)?;
        read_matching_sheet(spreadsheet.as_mut(), sheet_names, self.error_as_null)
    }
}

/// Selects the single sheet accepted by `sheet_names` and renders it as a grid.
pub(crate) fn read_matching_sheet(
    spreadsheet: &mut dyn Spreadsheet,
    sheet_names: &[String],
    error_as_null: bool,
) -> Result<Grid, RustyPlanError> {
    let criteria = Criteria::for_sheet_names(sheet_names, error_as_null)?;
    let mut matches: Vec<String> = spreadsheet
        .sheet_names()
        .into_iter()
        .filter(|name| criteria.accept(name))
        .collect();
    if matches.len() > 1 {
        return Err(RustyPlanError::AmbiguousSheetSelection(matches));
    }
    let sheet_name = matches
        .pop()
        .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet_names.join(" | ")))?;
    info!("Reading sheet '{}' of '{}'", sheet_name, spreadsheet.name());

    let shared_strings = spreadsheet.load_shared_strings()?;
    let sheet = spreadsheet.read_sheet(&sheet_name, &criteria)?;
    sheet.into_grid(&shared_strings)
}
