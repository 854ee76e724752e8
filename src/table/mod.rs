//! Table interpretation: from a raw cell grid to flat records.

pub mod grid;
pub mod normalize;
pub mod position;
pub mod record;
pub mod schema;
pub mod walker;

pub use grid::Grid;
pub use grid::Row;
pub use normalize::Scalar;
pub use record::Field;
pub use record::Metadata;
pub use record::Record;
pub use record::RecordContext;
pub use schema::Schema;
pub use walker::TableWalker;
pub use walker::WalkState;
