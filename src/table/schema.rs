//! Schema registry: what a file family's table looks like.
//!
//! A schema names the sheets to read, the department tags expected in file
//! names, the period labels, the global column headers and the ordered blocks
//! with the columns each block owns.

use crate::error::RustyPlanError;
use crate::table::normalize::normalize;
use crate::table::record::Field;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Schema of the sales plan ("ДКП") workbooks, embedded at build time.
const BUILTIN_DKP_SCHEMA: &str = include_str!("../../schemas/dkp.yaml");

/// Errors raised while loading or validating a schema
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Column '{0}' is not a known record field")]
    UnknownField(String),

    #[error("Identifier '{0}' is declared more than once")]
    DuplicateId(String),

    #[error("Schema has no global '{0}' column")]
    MissingClient(String),

    #[error("Schema declares no periods")]
    NoPeriods,

    #[error("'{0}' has no spellings")]
    EmptySpellings(String),

    #[error("Column '{0}' of a period block names unknown period '{1}'")]
    UnknownPeriod(String, String),

    #[error("Optional id '{0}' is not declared")]
    UnknownOptional(String),

    #[error("Unsupported schema file: {0}")]
    UnsupportedFormat(String),
}

/// A column header and the spellings it is recognised by.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub id: String,
    pub spellings: Vec<String>,
}

/// A titled group of columns. Its columns are resolved only inside the block's range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub spellings: Vec<String>,
    /// Record field fed by this block's period columns
    #[serde(default)]
    pub period_field: Option<Field>,
    #[serde(default)]
    pub fields: Vec<ColumnHeader>,
}

/// Table layout of one file family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Glob patterns of the sheets to read; exactly one must match
    pub sheet_names: Vec<String>,
    /// Department tags, matched literally in file names
    pub departments: Vec<String>,
    /// Period labels in order; the position + 1 is the month index
    pub periods: Vec<String>,
    /// Ids allowed to stay unresolved
    #[serde(default)]
    pub optional: BTreeSet<String>,
    /// Global column headers, resolved over the whole header row
    pub fields: Vec<ColumnHeader>,
    pub blocks: Vec<Block>,
}

impl Schema {
    /// Id of the column that tells data rows apart from everything else.
    pub const CLIENT: &'static str = "client";

    /// Parses a YAML schema, then validates and normalizes it.
    pub fn from_yaml(text: &str) -> Result<Self, RustyPlanError> {
        let schema: Schema = serde_yaml::from_str(text)?;
        schema.prepare()
    }

    /// Parses a JSON schema, then validates and normalizes it.
    pub fn from_json(text: &str) -> Result<Self, RustyPlanError> {
        let schema: Schema = serde_json::from_str(text)?;
        schema.prepare()
    }

    fn prepare(mut self) -> Result<Self, RustyPlanError> {
        self.normalize_spellings();
        self.validate()?;
        Ok(self)
    }

    /// Brings every spelling and period label into the form cells are compared in.
    fn normalize_spellings(&mut self) {
        let apply = |spellings: &mut Vec<String>| {
            for spelling in spellings.iter_mut() {
                *spelling = normalize(Some(spelling.as_str())).unwrap_or_default();
            }
            spellings.retain(|spelling| !spelling.is_empty());
        };
        apply(&mut self.periods);
        for header in &mut self.fields {
            apply(&mut header.spellings);
        }
        for block in &mut self.blocks {
            apply(&mut block.spellings);
            for header in &mut block.fields {
                apply(&mut header.spellings);
            }
        }
    }

    /// Checks the structural rules every schema must satisfy.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.periods.is_empty() {
            return Err(SchemaError::NoPeriods);
        }
        if !self.fields.iter().any(|header| header.id == Self::CLIENT) {
            return Err(SchemaError::MissingClient(Self::CLIENT.to_owned()));
        }

        let mut ids = HashSet::<&str>::new();
        for block in &self.blocks {
            if !ids.insert(block.id.as_str()) {
                return Err(SchemaError::DuplicateId(block.id.to_owned()));
            }
            if block.spellings.is_empty() {
                return Err(SchemaError::EmptySpellings(block.id.to_owned()));
            }
        }

        let mut column_ids = HashSet::<&str>::new();
        for (block, header) in self.columns() {
            if !column_ids.insert(header.id.as_str()) {
                return Err(SchemaError::DuplicateId(header.id.to_owned()));
            }
            if header.spellings.is_empty() {
                return Err(SchemaError::EmptySpellings(header.id.to_owned()));
            }
            match block.filter(|block| block.period_field.is_some()) {
                Some(_) => {
                    if let Some(period) = header.spellings.iter().find(|spelling| !self.periods.contains(spelling)) {
                        return Err(SchemaError::UnknownPeriod(header.id.to_owned(), period.to_owned()));
                    }
                }
                None => {
                    Field::from_str(&header.id).map_err(|_| SchemaError::UnknownField(header.id.to_owned()))?;
                }
            }
        }

        if let Some(id) = self.optional.iter().find(|id| !ids.contains(id.as_str()) && !column_ids.contains(id.as_str())) {
            return Err(SchemaError::UnknownOptional(id.to_owned()));
        }
        Ok(())
    }

    /// Every column header in schema order: globals first, then each block's own.
    pub fn columns(&self) -> impl Iterator<Item = (Option<&Block>, &ColumnHeader)> {
        self.fields
            .iter()
            .map(|header| (None, header))
            .chain(self.blocks.iter().flat_map(|block| block.fields.iter().map(move |header| (Some(block), header))))
    }

    /// Union of every column spelling, global and block-owned. Block titles are not included.
    pub fn known_headers(&self) -> HashSet<String> {
        self.columns()
            .flat_map(|(_, header)| header.spellings.iter().cloned())
            .collect()
    }

    /// Ids the completeness check may leave unresolved.
    pub fn is_optional(&self, id: &str) -> bool {
        self.optional.contains(id)
    }
}

/// Where a schema comes from.
pub trait SchemaSource {
    fn load(&self) -> Result<Schema, RustyPlanError>;
}

/// The schema shipped with the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinSchema;

impl SchemaSource for BuiltinSchema {
    fn load(&self) -> Result<Schema, RustyPlanError> {
        Schema::from_yaml(BUILTIN_DKP_SCHEMA)
    }
}

/// A schema read from a `.yaml`, `.yml` or `.json` file.
#[derive(Clone, Debug)]
pub struct SchemaFile(pub PathBuf);

impl SchemaFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }
}

impl SchemaSource for SchemaFile {
    fn load(&self) -> Result<Schema, RustyPlanError> {
        let extension = self.0
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "yaml" | "yml" => Schema::from_yaml(&std::fs::read_to_string(&self.0)?),
            "json" => Schema::from_json(&std::fs::read_to_string(&self.0)?),
            _ => Err(SchemaError::UnsupportedFormat(self.0.display().to_string()))?,
        }
    }
}
