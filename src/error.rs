use thiserror::Error;

/// Main error type for Rusty Plan.
/// Aggregates the document-level failure kinds together with errors from the
/// standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum RustyPlanError {
    #[error("{0}")]
    WithContextError(String),

    // Document failures reported to operators
    #[error("Department not in file name! File: {0}")]
    DepartmentMissing(String),

    #[error("Year not in file name! File: {0}")]
    YearMissing(String),

    #[error("Block or column headers not in file or changed: {}", .0.join(", "))]
    SchemaMismatch(Vec<String>),

    #[error("No records extracted from file {0}")]
    EmptyResult(String),

    #[error("Error processing row {row}: {message}")]
    RowProcessing { row: usize, message: String },

    #[error("More than one sheet matches the accepted names: {}", .0.join(", "))]
    AmbiguousSheetSelection(Vec<String>),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    RegexError(#[from] regex::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("{0}")]
    ConfigError(#[from] config::ConfigError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Table module errors
    #[error("{0}")]
    SchemaError(#[from] crate::table::schema::SchemaError),
}

/// Which part of the file name metadata could not be recovered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MetadataElement {
    Department,
    Year,
}

/// Machine-readable failure kind, one per distinct exit status.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    FilenameMetadataMissing(MetadataElement),
    SchemaMismatch,
    EmptyResult,
    RowProcessing,
    Unknown,
}

impl ErrorKind {
    /// Process exit status for this kind.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::FilenameMetadataMissing(MetadataElement::Year) => 1,
            Self::FilenameMetadataMissing(MetadataElement::Department) => 10,
            Self::SchemaMismatch => 2,
            Self::EmptyResult => 4,
            Self::RowProcessing => 5,
            Self::Unknown => 6,
        }
    }
}

impl RustyPlanError {
    /// Classifies the error into the kind batch tooling branches on.
    /// Ambiguous sheet selection and every infrastructure error are unknown.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DepartmentMissing(_) => ErrorKind::FilenameMetadataMissing(MetadataElement::Department),
            Self::YearMissing(_) => ErrorKind::FilenameMetadataMissing(MetadataElement::Year),
            Self::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
            Self::RowProcessing { .. } => ErrorKind::RowProcessing,
            _ => ErrorKind::Unknown,
        }
    }

    /// 1-based sheet row the error is scoped to, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::RowProcessing { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// Short code printed to stderr for the calling batch driver.
    pub fn signal(&self) -> String {
        match self.kind() {
            ErrorKind::RowProcessing => format!("5_in_row_{}", self.row().unwrap_or_default()),
            ErrorKind::Unknown => "unknown".to_owned(),
            kind => kind.exit_code().to_string(),
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyPlanError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| match e {
            // Document failures already carry their own context
            RustyPlanError::AmbiguousSheetSelection(_) => e,
            e => RustyPlanError::WithContextError(format!("{}: {}", message, e)),
        })
    }
}
