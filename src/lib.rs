//! # Rusty Plan
//!
//! Interprets semi-structured sales plan workbooks into flat, monthly JSON records.
//!
//! The workbooks carry multi-row, merged-cell headers that drift between
//! files: block titles sit above the column headers or below them, columns
//! move around and extra rows appear. A [`table::Schema`] lists the spellings
//! each block and column may appear under, and the [`table::TableWalker`]
//! finds them row by row before turning every client row into one record per
//! period.
//!
//! ## Pipeline
//!
//! - **File name metadata**: the department tag and the year are taken from the document name
//! - **Grid**: the single matching sheet is read into rows of cell texts ([`spreadsheet::GridSource`])
//! - **Walk**: header rows are scored, block and column positions resolved, data rows extracted
//! - **Output**: records are written to `<output dir>/<document name>.json` ([`output::write_records`])
//!
//! Failures map to distinct exit codes ([`error::ErrorKind`]) and are sent to
//! operators through a [`notify::Notifier`].

pub mod error;
pub(crate) mod helpers;
pub mod notify;
pub mod output;
pub mod runner;
pub mod settings;
pub mod spreadsheet;
pub mod table;

pub use error::ErrorKind;
pub use error::RustyPlanError;
pub use runner::run;
pub use runner::Context;
pub use runner::RunFailure;
pub use runner::RunOutcome;
