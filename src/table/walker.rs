//! Row classification state machine.
//!
//! The walker reads a grid top to bottom. Header rows (scored against the
//! known column spellings) fix column positions, block rows fix block starts
//! and, once the header is complete, every row with a client becomes records.

use crate::error::RustyPlanError;
use crate::table::grid::Grid;
use crate::table::grid::Row;
use crate::table::normalize::normalize;
use crate::table::position::block_ranges;
use crate::table::position::check_complete;
use crate::table::position::resolve_positions;
use crate::table::position::score;
use crate::table::position::PositionMap;
use crate::table::record::Record;
use crate::table::record::RecordContext;
use crate::table::record::RecordLayout;
use crate::table::schema::Schema;
use std::collections::HashSet;
use tracing::debug;
use tracing::info;

/// Where the walker is in the document.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkState {
    /// No header row seen yet
    SeekingHeader,
    /// A header row was seen but some blocks are still unresolved
    SeekingBlocks,
    /// Header complete; rows with a client are data
    InTable,
}

/// Walks the rows of one grid against one schema.
pub struct TableWalker<'s> {
    schema: &'s Schema,
    layout: RecordLayout,
    known_headers: HashSet<String>,
    threshold: u8,
    state: WalkState,
    positions: PositionMap,
    /// Normalized cells of the last header row
    header: Option<Vec<Option<String>>>,
}

impl<'s> TableWalker<'s> {
    /// Creates a walker; rows scoring above `threshold` are header rows.
    pub fn new(schema: &'s Schema, threshold: u8) -> Result<Self, RustyPlanError> {
        Ok(Self {
            schema,
            layout: RecordLayout::new(schema)?,
            known_headers: schema.known_headers(),
            threshold,
            state: WalkState::SeekingHeader,
            positions: PositionMap::for_schema(schema),
            header: None,
        })
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    /// Classifies every row of `grid` and extracts the records of its data rows.
    ///
    /// # Returns
    /// * `Ok(records)` - possibly empty when no header row was found
    /// * `Err(SchemaMismatch)` - the header lacks required blocks or columns
    /// * `Err(RowProcessing)` - a data row could not be extracted
    pub fn walk(&mut self, grid: &Grid, context: &RecordContext) -> Result<Vec<Record>, RustyPlanError> {
        let mut records = Vec::new();
        for row in &grid.rows {
            self.visit(row, context, &mut records)?;
        }
        self.finish()?;
        Ok(records)
    }

    fn visit(&mut self, row: &Row, context: &RecordContext, records: &mut Vec<Record>) -> Result<(), RustyPlanError> {
        let row_score = score(&row.cells, &self.known_headers);
        if row_score > self.threshold {
            debug!("Row {} is a header row (score {})", row.number + 1, row_score);
            return self.on_header(row);
        }

        if self.state != WalkState::InTable {
            let written = resolve_positions(&row.cells, 0..row.len(), &self.schema.blocks, &mut self.positions.blocks);
            if written > 0 {
                debug!("Row {} declares {} block(s)", row.number + 1, written);
                if self.state == WalkState::SeekingBlocks && self.blocks_resolved() {
                    if let Some(header) = self.header.take() {
                        self.resolve_block_fields(&header);
                        self.header = Some(header);
                    }
                    self.enter_table(row)?;
                }
            }
            return Ok(());
        }

        if self.has_client(row) {
            debug!("Row {} is a data row", row.number + 1);
            records.extend(self.layout.extract(row, &self.positions, context)?);
        } else {
            debug!("Row {} skipped", row.number + 1);
        }
        Ok(())
    }

    /// Resolves globals over the whole row, then blocks, then block-owned columns.
    fn on_header(&mut self, row: &Row) -> Result<(), RustyPlanError> {
        let cells: Vec<Option<String>> = row.cells.iter().map(|cell| normalize(cell.as_deref())).collect();
        resolve_positions(&cells, 0..cells.len(), &self.schema.fields, &mut self.positions.columns);
        resolve_positions(&cells, 0..cells.len(), &self.schema.blocks, &mut self.positions.blocks);
        self.resolve_block_fields(&cells);
        self.header = Some(cells);

        if self.blocks_resolved() {
            if self.state != WalkState::InTable {
                self.enter_table(row)?;
            } else {
                self.check()?;
            }
        } else {
            self.state = WalkState::SeekingBlocks;
        }
        Ok(())
    }

    /// Resolves each resolved block's own columns inside that block's range of `header`.
    fn resolve_block_fields(&mut self, header: &[Option<String>]) {
        for range in block_ranges(&self.positions.blocks, header.len()) {
            if let Some(block) = self.schema.blocks.iter().find(|block| block.id == range.id) {
                let written = resolve_positions(header, range.range(), &block.fields, &mut self.positions.columns);
                debug!("Block '{}' spans columns {:?}, {} column(s) resolved", block.id, range.range(), written);
            }
        }
    }

    fn blocks_resolved(&self) -> bool {
        self.positions
            .blocks
            .unresolved()
            .all(|id| self.schema.is_optional(id))
    }

    fn check(&self) -> Result<(), RustyPlanError> {
        let missing = check_complete(&self.positions, &self.schema.optional);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RustyPlanError::SchemaMismatch(missing))
        }
    }

    fn enter_table(&mut self, row: &Row) -> Result<(), RustyPlanError> {
        self.check()?;
        info!("Table header complete at row {}", row.number + 1);
        self.state = WalkState::InTable;
        Ok(())
    }

    fn has_client(&self, row: &Row) -> bool {
        self.positions
            .columns
            .get(Schema::CLIENT)
            .and_then(|index| row.get(index))
            .map(|client| !client.trim().is_empty())
            .unwrap_or(false)
    }

    /// A header whose blocks never showed up is a schema mismatch, not an empty table.
    fn finish(&self) -> Result<(), RustyPlanError> {
        match self.state {
            WalkState::SeekingBlocks => self.check(),
            WalkState::SeekingHeader | WalkState::InTable => Ok(()),
        }
    }
}
