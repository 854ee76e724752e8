//! Header scoring and column position resolution.

use crate::table::normalize::normalize;
use crate::table::schema::Block;
use crate::table::schema::ColumnHeader;
use crate::table::schema::Schema;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::ops::Range;

/// Anything recognised in a row by one of its spellings.
pub trait Spelled {
    fn id(&self) -> &str;
    fn spellings(&self) -> &[String];
}

impl Spelled for ColumnHeader {
    fn id(&self) -> &str {
        &self.id
    }

    fn spellings(&self) -> &[String] {
        &self.spellings
    }
}

impl Spelled for Block {
    fn id(&self) -> &str {
        &self.id
    }

    fn spellings(&self) -> &[String] {
        &self.spellings
    }
}

/// Ordered `(id, column index)` slots. A slot is written only while it is empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Positions {
    slots: Vec<(String, Option<usize>)>,
}

impl Positions {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = ids.into_iter().map(|id| (id.into(), None)).collect();
        Self { slots }
    }

    /// Column index resolved for `id`.
    pub fn get(&self, id: &str) -> Option<usize> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == id)
            .and_then(|(_, index)| *index)
    }

    /// Records `index` for `id` unless the slot is already filled or unknown.
    /// Returns whether the slot was written.
    pub fn set(&mut self, id: &str, index: usize) -> bool {
        match self.slots.iter_mut().find(|(slot, _)| slot == id) {
            Some((_, position @ None)) => {
                *position = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<usize>)> {
        self.slots.iter().map(|(id, index)| (id.as_str(), *index))
    }

    /// Ids still without a column, in slot order.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, index)| index.is_none()).map(|(id, _)| id)
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved().next().is_none()
    }
}

/// Resolved block starts and column indexes of one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionMap {
    pub blocks: Positions,
    pub columns: Positions,
}

impl PositionMap {
    /// Empty slots for every block and column of the schema, in schema order.
    pub fn for_schema(schema: &Schema) -> Self {
        Self {
            blocks: Positions::new(schema.blocks.iter().map(|block| block.id.as_str())),
            columns: Positions::new(schema.columns().map(|(_, header)| header.id.as_str())),
        }
    }
}

/// Half-open column range `[start, end)` a block spans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

impl BlockRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Percentage of a row's cells that are known column spellings, truncated.
/// An empty row scores 0.
pub fn score(cells: &[Option<String>], known_headers: &HashSet<String>) -> u8 {
    if cells.is_empty() {
        return 0;
    }
    let matches = cells
        .iter()
        .filter_map(|cell| normalize(cell.as_deref()))
        .filter(|cell| known_headers.contains(cell))
        .count();
    (matches * 100 / cells.len()) as u8
}

/// Records the index of each header whose spelling appears in `cells` within `range`.
///
/// # Arguments
/// * `cells` - Row cells, normalized before comparison
/// * `range` - Column range to search
/// * `headers` - Candidates, matched by exact normalized spelling
/// * `positions` - Slots to fill; filled slots are left untouched
///
/// # Returns
/// * `usize` - Number of slots written by this call
pub fn resolve_positions<'a, H, I>(cells: &[Option<String>], range: Range<usize>, headers: I, positions: &mut Positions) -> usize
where
    H: Spelled + 'a,
    I: IntoIterator<Item = &'a H>,
{
    let headers: Vec<&H> = headers.into_iter().collect();
    let mut written = 0usize;
    for (index, cell) in cells.iter().enumerate() {
        if !range.contains(&index) {
            continue;
        }
        let cell = match normalize(cell.as_deref()) {
            Some(cell) if !cell.is_empty() => cell,
            _ => continue,
        };
        for header in &headers {
            if header.spellings().iter().any(|spelling| *spelling == cell) && positions.set(header.id(), index) {
                written += 1;
            }
        }
    }
    written
}

/// Splits `[first block start, row_len)` into consecutive block ranges.
/// Unresolved blocks get no range.
pub fn block_ranges(blocks: &Positions, row_len: usize) -> Vec<BlockRange> {
    let mut starts: Vec<(&str, usize)> = blocks
        .iter()
        .filter_map(|(id, index)| index.map(|index| (id, index)))
        .collect();
    starts.sort_by_key(|(_, start)| *start);

    let ends = starts
        .iter()
        .skip(1)
        .map(|(_, start)| *start)
        .chain(std::iter::once(row_len));
    starts
        .iter()
        .zip(ends)
        .map(|((id, start), end)| BlockRange {
            id: (*id).to_owned(),
            start: *start,
            end: end.max(*start),
        })
        .collect()
}

/// Ids without a column that are not excused, blocks first, in schema order.
/// An empty result means the header is complete.
pub fn check_complete(positions: &PositionMap, excluded: &BTreeSet<String>) -> Vec<String> {
    positions
        .blocks
        .unresolved()
        .chain(positions.columns.unresolved())
        .filter(|id| !excluded.contains(*id))
        .map(str::to_owned)
        .collect()
}
