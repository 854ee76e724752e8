//! Output records and their extraction from data rows.

use crate::error::RustyPlanError;
use crate::table::grid::Row;
use crate::table::normalize::infer_scalar;
use crate::table::normalize::Scalar;
use crate::table::position::PositionMap;
use crate::table::schema::Schema;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Declares the closed set of record fields together with their value struct.
macro_rules! record_fields {
    ($($variant:ident => $name:ident),* $(,)?) => {
        /// A named value of an output record.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Field {
            $($variant),*
        }

        impl Field {
            /// Every field in declaration order.
            pub const ALL: &'static [Field] = &[$(Field::$variant),*];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Field::$variant => stringify!($name)),*
                }
            }
        }

        impl FromStr for Field {
            type Err = RustyPlanError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $(stringify!($name) => Ok(Field::$variant),)*
                    _ => Err(RustyPlanError::WithContextError(format!("Unknown field '{name}'"))),
                }
            }
        }

        /// One value per field; fields no column feeds stay `Null`.
        #[derive(Clone, Debug, Default, PartialEq, Serialize)]
        pub struct FieldValues {
            $(pub $name: Scalar),*
        }

        impl FieldValues {
            pub fn get(&self, field: Field) -> &Scalar {
                match field {
                    $(Field::$variant => &self.$name),*
                }
            }

            pub fn get_mut(&mut self, field: Field) -> &mut Scalar {
                match field {
                    $(Field::$variant => &mut self.$name),*
                }
            }
        }
    };
}

record_fields! {
    Client => client,
    Description => description,
    Project => project,
    Cargo => cargo,
    Direction => direction,
    Bay => bay,
    Owner => owner,
    ContainerSize => container_size,

    ContainerCount => container_count,
    Teu => teu,

    UnitMarginIncomeMarine => unit_margin_income_marine,
    UnitMarginIncomePort => unit_margin_income_port,
    UnitMarginIncomeTerminal1 => unit_margin_income_terminal1,
    UnitMarginIncomeTerminal2 => unit_margin_income_terminal2,
    UnitMarginIncomeOtherTerminal => unit_margin_income_other_terminal,
    UnitMarginIncomeAvto1 => unit_margin_income_avto1,
    UnitMarginIncomeAvto2 => unit_margin_income_avto2,
    UnitMarginIncomeAvto3 => unit_margin_income_avto3,
    UnitMarginIncomeRzhd1 => unit_margin_income_rzhd1,
    UnitMarginIncomeRzhd2 => unit_margin_income_rzhd2,
    UnitMarginIncomeCustom => unit_margin_income_custom,
    UnitMarginIncomeDemurrage => unit_margin_income_demurrage,
    UnitMarginIncomeStorage => unit_margin_income_storage,
    UnitMarginIncomeOther1 => unit_margin_income_other1,
    UnitMarginIncomeOther2 => unit_margin_income_other2,

    ServiceMarine => service_marine,
    ServicePort => service_port,
    ServiceTerminal1 => service_terminal1,
    ServiceTerminal2 => service_terminal2,
    ServiceOtherTerminal => service_other_terminal,
    ServiceAvto1 => service_avto1,
    ServiceAvto2 => service_avto2,
    ServiceAvto3 => service_avto3,
    ServiceRzhd1 => service_rzhd1,
    ServiceRzhd2 => service_rzhd2,
    ServiceCustom => service_custom,
    ServiceDemurrage => service_demurrage,
    ServiceStorage => service_storage,
    ServiceOther1 => service_other1,
    ServiceOther2 => service_other2,

    CoExecutorMarine => co_executor_marine,
    CoExecutorPort => co_executor_port,
    CoExecutorTerminal1 => co_executor_terminal1,
    CoExecutorTerminal2 => co_executor_terminal2,
    CoExecutorOtherTerminal => co_executor_other_terminal,
    CoExecutorAvto1 => co_executor_avto1,
    CoExecutorAvto2 => co_executor_avto2,
    CoExecutorAvto3 => co_executor_avto3,
    CoExecutorRzhd1 => co_executor_rzhd1,
    CoExecutorRzhd2 => co_executor_rzhd2,
    CoExecutorCustom => co_executor_custom,
    CoExecutorDemurrage => co_executor_demurrage,
    CoExecutorStorage => co_executor_storage,
    CoExecutorOther1 => co_executor_other1,
    CoExecutorOther2 => co_executor_other2,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Department and year recovered from the document's file name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub department: String,
    pub year: i32,
}

impl Metadata {
    /// Finds the first department tag and the first four-digit run in `file_name`.
    ///
    /// # Arguments
    /// * `file_name` - Base name of the document
    /// * `departments` - Accepted department tags, matched literally
    ///
    /// # Returns
    /// * `Result<Metadata, RustyPlanError>` - `DepartmentMissing` is checked before `YearMissing`
    pub fn from_file_name(file_name: &str, departments: &[String]) -> Result<Self, RustyPlanError> {
        let department = if departments.is_empty() {
            None
        } else {
            let pattern = departments
                .iter()
                .map(|department| regex::escape(department))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&pattern)?
                .find(file_name)
                .map(|found| found.as_str().to_owned())
        };
        let department = department.ok_or_else(|| RustyPlanError::DepartmentMissing(file_name.to_owned()))?;

        let year = Regex::new(r"[0-9]{4}")?
            .find(file_name)
            .ok_or_else(|| RustyPlanError::YearMissing(file_name.to_owned()))?
            .as_str()
            .parse::<i32>()?;
        Ok(Self { department, year })
    }
}

/// One output row: a data row seen through one period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub values: FieldValues,
    /// 1-based period index
    pub month: u32,
    pub month_string: String,
    /// First day of the period, `YYYY-MM-01`
    pub date: String,
    pub original_file_name: String,
    pub original_file_parsed_on: String,
}

/// Where a record field takes its value from.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// The resolved column with this id
    Column(String),
    /// The column of this block whose spellings contain the current period
    Period(String),
}

/// A period column of a block: its id and the period labels it represents.
#[derive(Clone, Debug, PartialEq)]
struct PeriodColumn {
    id: String,
    periods: Vec<String>,
}

/// Per-document facts every record repeats.
#[derive(Clone, Debug)]
pub struct RecordContext {
    pub metadata: Metadata,
    pub file_name: String,
    /// Parse timestamp, `YYYY-MM-DD HH:MM:SS`, fixed for the whole document
    pub parsed_on: String,
}

/// Field sources and period columns derived once from a schema.
#[derive(Clone, Debug)]
pub struct RecordLayout {
    sources: Vec<(Field, Source)>,
    periods: Vec<String>,
    period_columns: Vec<(String, Vec<PeriodColumn>)>,
    optional: Vec<String>,
}

impl RecordLayout {
    pub fn new(schema: &Schema) -> Result<Self, RustyPlanError> {
        let mut sources = Vec::new();
        let mut period_columns = Vec::new();
        for (block, header) in schema.columns() {
            if block.and_then(|block| block.period_field).is_none() {
                sources.push((header.id.parse::<Field>()?, Source::Column(header.id.to_owned())));
            }
        }
        for block in &schema.blocks {
            if let Some(field) = block.period_field {
                sources.push((field, Source::Period(block.id.to_owned())));
                let columns = block
                    .fields
                    .iter()
                    .map(|header| PeriodColumn { id: header.id.to_owned(), periods: header.spellings.to_owned() })
                    .collect();
                period_columns.push((block.id.to_owned(), columns));
            }
        }
        Ok(Self {
            sources,
            periods: schema.periods.to_owned(),
            period_columns,
            optional: schema.optional.iter().cloned().collect(),
        })
    }

    pub fn sources(&self) -> &[(Field, Source)] {
        &self.sources
    }

    /// Builds one record per period from a data row.
    ///
    /// # Arguments
    /// * `row` - The data row
    /// * `positions` - Resolved column positions
    /// * `context` - Metadata and file facts shared by every record
    ///
    /// # Returns
    /// * `Result<Vec<Record>, RustyPlanError>` - `RowProcessing` naming the 1-based sheet row on failure
    pub fn extract(&self, row: &Row, positions: &PositionMap, context: &RecordContext) -> Result<Vec<Record>, RustyPlanError> {
        let mut records = Vec::with_capacity(self.periods.len());
        for (index, period) in self.periods.iter().enumerate() {
            let month = index as u32 + 1;
            let mut values = FieldValues::default();
            for (field, source) in &self.sources {
                let column = match source {
                    Source::Column(id) => Some(id.as_str()),
                    Source::Period(block) => self.period_column(block, period),
                };
                *values.get_mut(*field) = match column {
                    Some(id) => infer_scalar(self.read(row, positions, id)?),
                    None => Scalar::Null,
                };
            }

            let date = NaiveDate::from_ymd_opt(context.metadata.year, month, 1)
                .ok_or_else(|| row_error(row, format!("no calendar date for period {month} of {}", context.metadata.year)))?;
            records.push(Record {
                metadata: context.metadata.to_owned(),
                values,
                month,
                month_string: period.to_owned(),
                date: date.format("%Y-%m-%d").to_string(),
                original_file_name: context.file_name.to_owned(),
                original_file_parsed_on: context.parsed_on.to_owned(),
            });
        }
        Ok(records)
    }

    /// Id of the first column of `block` that represents `period`.
    fn period_column(&self, block: &str, period: &str) -> Option<&str> {
        self.period_columns
            .iter()
            .find(|(id, _)| id == block)
            .and_then(|(_, columns)| columns.iter().find(|column| column.periods.iter().any(|label| label == period)))
            .map(|column| column.id.as_str())
    }

    /// Cell text of column `id`; unresolved optional columns read as blank.
    fn read<'r>(&self, row: &'r Row, positions: &PositionMap, id: &str) -> Result<Option<&'r str>, RustyPlanError> {
        match positions.columns.get(id) {
            Some(index) if index < row.len() => Ok(row.get(index)),
            Some(index) => Err(row_error(row, format!("column '{id}' at index {index} is outside the row of {} cells", row.len()))),
            None if self.optional.iter().any(|optional| optional == id) => Ok(None),
            None => Err(row_error(row, format!("column '{id}' has no resolved position"))),
        }
    }
}

fn row_error(row: &Row, message: String) -> RustyPlanError {
    RustyPlanError::RowProcessing { row: row.number + 1, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::position::Positions;

    const SCHEMA: &str = r#"
sheet_names: [Plan]
departments: [DKP]
periods: [jan, feb, mar]
optional: [bay]
fields:
  - { id: client, spellings: [Client] }
  - { id: cargo, spellings: [Cargo] }
  - { id: bay, spellings: [Bay] }
blocks:
  - id: volumes
    spellings: [VOLUMES]
    period_field: container_count
    fields:
      - { id: volumes_q1, spellings: [jan, feb] }
  - id: port
    spellings: [PORT]
    fields:
      - { id: service_port, spellings: [port] }
"#;

    fn context() -> RecordContext {
        RecordContext {
            metadata: Metadata { department: "DKP".to_owned(), year: 2024 },
            file_name: "DKP_Report_2024.xlsx".to_owned(),
            parsed_on: "2024-05-01 10:00:00".to_owned(),
        }
    }

    fn positions() -> PositionMap {
        let mut columns = Positions::new(["client", "cargo", "bay", "volumes_q1", "service_port"]);
        columns.set("client", 0);
        columns.set("cargo", 1);
        columns.set("volumes_q1", 2);
        columns.set("service_port", 3);
        PositionMap { blocks: Positions::new(["volumes", "port"]), columns }
    }

    #[test]
    fn field_names_match_serde_names() {
        assert_eq!(Field::ALL.len(), 55);
        for field in Field::ALL {
            let json = serde_json::to_string(field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
            assert_eq!(field.as_str().parse::<Field>().unwrap(), *field);
        }
        assert!("colour".parse::<Field>().is_err());
    }

    #[test]
    fn metadata_from_file_name() {
        let departments = vec!["ДКП_ЮФО".to_owned(), "ДКП_ДВ".to_owned()];
        let metadata = Metadata::from_file_name("План ДКП_ДВ 2025 v2.xlsx", &departments).unwrap();
        assert_eq!(metadata, Metadata { department: "ДКП_ДВ".to_owned(), year: 2025 });

        let error = Metadata::from_file_name("План 2025.xlsx", &departments).unwrap_err();
        assert!(matches!(error, RustyPlanError::DepartmentMissing(_)));
        let error = Metadata::from_file_name("План ДКП_ЮФО.xlsx", &departments).unwrap_err();
        assert!(matches!(error, RustyPlanError::YearMissing(_)));
    }

    #[test]
    fn extracts_one_record_per_period() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        let layout = RecordLayout::new(&schema).unwrap();
        let row = Row::from_texts(6, &["ООО Ромашка", "уголь", "1 200", "да"]);
        let records = layout.extract(&row, &positions(), &context()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].values.client, Scalar::String("ООО Ромашка".to_owned()));
        assert_eq!(records[0].values.container_count, Scalar::Integer(1200));
        assert_eq!(records[1].values.container_count, Scalar::Integer(1200));
        assert_eq!(records[2].values.container_count, Scalar::Null);
        assert_eq!(records[2].values.service_port, Scalar::Boolean(true));
        assert_eq!(records[0].values.bay, Scalar::Null);
        assert_eq!(records[0].values.teu, Scalar::Null);
        assert_eq!(records[2].month, 3);
        assert_eq!(records[2].month_string, "mar");
        assert_eq!(records[2].date, "2024-03-01");
    }

    #[test]
    fn short_rows_fail_with_the_sheet_row() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        let layout = RecordLayout::new(&schema).unwrap();
        let row = Row::from_texts(6, &["ООО Ромашка", "уголь"]);
        let error = layout.extract(&row, &positions(), &context()).unwrap_err();
        assert_eq!(error.row(), Some(7));
        assert_eq!(error.signal(), "5_in_row_7");
    }

    #[test]
    fn records_serialize_flat() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        let layout = RecordLayout::new(&schema).unwrap();
        let row = Row::from_texts(6, &["ООО Ромашка", "уголь", "12.5", ""]);
        let records = layout.extract(&row, &positions(), &context()).unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["department"], "DKP");
        assert_eq!(json["year"], 2024);
        assert_eq!(json["client"], "ООО Ромашка");
        assert_eq!(json["container_count"], 12.5);
        assert_eq!(json["service_port"], serde_json::Value::Null);
        assert_eq!(json["date"], "2024-01-01");
        assert_eq!(json["original_file_name"], "DKP_Report_2024.xlsx");
        assert_eq!(json.as_object().unwrap().len(), 2 + 55 + 5);
    }
}
