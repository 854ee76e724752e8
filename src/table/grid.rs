/// One non-empty sheet row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    /// 0-based row index in the source sheet
    pub number: usize,
    /// Cell texts from column `A` to the rightmost used column
    pub cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(number: usize, cells: Vec<Option<String>>) -> Self {
        Self { number, cells }
    }

    /// Builds a row from plain strings; empty strings become `None`.
    pub fn from_texts<S: AsRef<str>>(number: usize, texts: &[S]) -> Self {
        let cells = texts
            .iter()
            .map(|text| Some(text.as_ref().to_owned()).filter(|text| !text.is_empty()))
            .collect();
        Self { number, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Cell text at a column, `None` for blank or out-of-row columns.
    pub fn get(&self, col: usize) -> Option<&str> {
        self.cells.get(col).and_then(|cell| cell.as_deref())
    }
}

/// Rectangular-ish view of one sheet: rows in sheet order, empty rows removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Row>,
}

impl Grid {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Builds a grid from plain strings, numbering rows from 0.
    pub fn from_texts<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(number, texts)| Row::from_texts(number, texts))
            .filter(|row| !row.is_empty())
            .collect();
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_texts_drops_empty_rows_and_keeps_numbers() {
        let grid = Grid::from_texts(&[vec!["a", ""], vec!["", ""], vec!["", "b"]]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1].number, 2);
        assert_eq!(grid.rows[1].get(0), None);
        assert_eq!(grid.rows[1].get(1), Some("b"));
        assert_eq!(grid.rows[1].get(7), None);
    }
}
