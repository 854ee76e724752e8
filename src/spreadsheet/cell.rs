use crate::error::RustyPlanError;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use chrono::TimeDelta;
use chrono::NaiveDate;

/// Types of cell data in workbook parts.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 0/1
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Date and time tokens inside literals, escapes and `[...]` sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_section = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_section => is_literal = true,

                ']' if is_section => is_section = false,
                '[' if !is_literal => is_section = true,
                _ if is_literal || is_section => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// Represents a single cell in a worksheet with position, type, and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value; the shared string index for `SharedString` cells
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Renders the cell the way it reads in the spreadsheet UI.
    /// Dates become ISO strings, booleans become `true`/`false`.
    pub(crate) fn text(&self, shared_strings: &[String]) -> Result<String, RustyPlanError> {
        let mapper = |message: String| SpreadsheetError::CellValueError(self.reference(), message);
        let out_of_range = || mapper(format!("date serial '{}' is out of range", self.value));
        let text = match self.kind {
            CellType::Boolean => if self.value == "1" { "true" } else { "false" }.to_owned(),
            CellType::SharedString => {
                let index = self.value.parse::<usize>()
                    .map_err(|_| mapper(format!("invalid shared string index '{}'", self.value)))?;
                shared_strings
                    .get(index)
                    .cloned()
                    .ok_or_else(|| mapper(format!("shared string {index} does not exist")))?
            }
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false)?.ok_or_else(out_of_range)?,
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true)?.ok_or_else(out_of_range)?,
            CellType::NumberDate1900 => to_date_string(&self.value, false)?.ok_or_else(out_of_range)?,
            CellType::NumberDate1904 => to_date_string(&self.value, true)?.ok_or_else(out_of_range)?,
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value)?,
            CellType::IsoDateTime => self.value.replace('T', " "),
            _ => self.value.to_owned(),
        };
        Ok(text)
    }
}

/// Converts Excel numeric date to ISO date string.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
/// `None` when the serial falls outside the representable calendar.
fn to_date_string(value: &str, is_1904: bool) -> Result<Option<String>, RustyPlanError> {
    let days = value.parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal");
    let date = days
        .checked_add(offset)
        .and_then(TimeDelta::try_days)
        .and_then(|duration| epoch.checked_add_signed(duration));
    Ok(date.map(|date| date.format("%Y-%m-%d").to_string()))
}

/// Converts the fractional day of an Excel number to an ISO time string.
fn to_time_string(value: &str) -> Result<String, RustyPlanError> {
    let factor = value.parse::<f64>()?.fract();
    let mut hours = (factor * 86_400_000f64).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(timestamp)
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<Option<String>, RustyPlanError> {
    let Some(date) = to_date_string(value, is_1904)? else {
        return Ok(None);
    };
    let time = to_time_string(value)?;
    Ok(Some(format!("{date} {time}")))
}
