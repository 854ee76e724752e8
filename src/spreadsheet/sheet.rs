use crate::error::RustyPlanError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::table::grid::Grid;
use crate::table::grid::Row;

/// Cells collected from one worksheet, in document order.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_upper_bound: None,
            col_upper_bound: None,
        }
    }

    /// Adds a cell to the sheet, updating the data range.
    pub(super) fn push(&mut self, cell: Cell) {
        self.row_upper_bound = self.row_upper_bound.max(Some(cell.row));
        self.col_upper_bound = self.col_upper_bound.max(Some(cell.col));
        self.cells.push(cell);
    }

    /// Renders the cells into dense rows starting at column `A`.
    ///
    /// # Arguments
    /// * `shared_strings` - Shared string table of the workbook
    ///
    /// # Returns
    /// * `Result<Grid, RustyPlanError>` - Rows that hold at least one non-blank cell
    pub(crate) fn into_grid(mut self, shared_strings: &[String]) -> Result<Grid, RustyPlanError> {
        let width = self.col_upper_bound.map(|col| col + 1).unwrap_or_default();
        // Writers may emit rows out of order
        self.cells.sort_by_key(|cell| (cell.row, cell.col));

        let mut rows = Vec::<Row>::new();
        for cell in &self.cells {
            if cell.kind == CellType::Empty {
                continue;
            }
            let text = cell.text(shared_strings)?;
            if text.is_empty() {
                continue;
            }
            if rows.last().map(|row| row.number != cell.row).unwrap_or(true) {
                rows.push(Row::new(cell.row, vec![None; width]));
            }
            if let Some(row) = rows.last_mut() {
                row.cells[cell.col] = Some(text);
            }
        }
        Ok(Grid::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: usize, col: usize, kind: CellType, value: &str) -> Cell {
        Cell { row, col, kind, value: value.to_owned() }
    }

    #[test]
    fn into_grid_builds_dense_rows() {
        let mut sheet = Sheet::new("plan.xlsx", "ПЛАН_ПРОДАЖ");
        sheet.push(cell(3, 2, CellType::Number, "7"));
        sheet.push(cell(0, 0, CellType::SharedString, "0"));
        sheet.push(cell(0, 1, CellType::InlineString, ""));
        sheet.push(cell(1, 1, CellType::Empty, ""));
        sheet.push(cell(3, 0, CellType::SharedString, "1"));
        assert_eq!(sheet.row_upper_bound, Some(3));

        let shared = vec!["клиент".to_owned(), "ООО Ромашка".to_owned()];
        let grid = sheet.into_grid(&shared).unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].cells, vec![Some("клиент".to_owned()), None, None]);
        assert_eq!(grid.rows[1].number, 3);
        assert_eq!(grid.rows[1].cells, vec![Some("ООО Ромашка".to_owned()), None, Some("7".to_owned())]);
    }
}
