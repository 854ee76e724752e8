use rusty_plan::error::MetadataElement;
use rusty_plan::notify::Notifier;
use rusty_plan::notify::Severity;
use rusty_plan::spreadsheet::GridSource;
use rusty_plan::spreadsheet::WorkbookGridSource;
use rusty_plan::table::schema::BuiltinSchema;
use rusty_plan::table::schema::SchemaSource;
use rusty_plan::table::Grid;
use rusty_plan::table::Schema;
use rusty_plan::Context;
use rusty_plan::ErrorKind;
use rusty_plan::RunOutcome;
use rusty_plan::RustyPlanError;
use serde_json::Value;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

const GLOBALS: [&str; 8] = ["client", "description", "project", "cargo", "direction", "bay", "owner", "container_size"];

/// One volumes block over the twelve months, plus the given global columns spelled as their ids.
fn schema_with(globals: &[&str]) -> Schema {
    let fields: String = globals
        .iter()
        .map(|id| format!("  - {{ id: {id}, spellings: [{id}] }}\n"))
        .collect();
    let columns: String = MONTHS
        .iter()
        .map(|month| format!("      - {{ id: volumes_{month}, spellings: [{month}] }}\n"))
        .collect();
    let text = format!(
        "sheet_names: [Plan]\n\
         departments: [DKP]\n\
         periods: [{}]\n\
         fields:\n{fields}\
         blocks:\n  - id: volumes\n    spellings: [VOLUMES]\n    period_field: container_count\n    fields:\n{columns}",
        MONTHS.join(", ")
    );
    Schema::from_yaml(&text).unwrap()
}

fn schema() -> Schema {
    schema_with(&["client", "cargo"])
}

struct FixedGrid(Grid);

impl GridSource for FixedGrid {
    fn read_grid(&mut self, _document: &Path, _sheet_names: &[String]) -> Result<Grid, RustyPlanError> {
        Ok(self.0.clone())
    }
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(Severity, String)>>>);

impl Notifier for Recorder {
    fn notify(&self, severity: Severity, message: &str) {
        self.0.lock().unwrap().push((severity, message.to_owned()));
    }
}

fn grid(client_header: &str, client: &str) -> Grid {
    let mut header = vec![client_header.to_owned(), "cargo".to_owned()];
    header.extend(MONTHS.iter().map(|month| month.to_string()));
    let mut blocks = vec![String::new(); 14];
    blocks[2] = "VOLUMES".to_owned();
    let mut data = vec![client.to_owned(), "coal".to_owned()];
    data.extend((1..=12).map(|value| value.to_string()));
    Grid::from_texts(&[header, blocks, data])
}

fn context(grid: Grid, recorder: &Recorder) -> Context {
    Context {
        schema: schema(),
        grid_source: Box::new(FixedGrid(grid)),
        notifier: Box::new(recorder.clone()),
        header_threshold: 3,
    }
}

#[test]
fn header_block_and_data_rows_give_twelve_records() {
    let recorder = Recorder::default();
    let directory = tempfile::tempdir().unwrap();
    let mut context = context(grid("client", "Acme"), &recorder);

    let outcome = rusty_plan::run(Path::new("DKP_Report_2024.xlsx"), directory.path(), &mut context);
    let output = directory.path().join("DKP_Report_2024.xlsx.json");
    assert_eq!(outcome, RunOutcome::Success { output: output.clone(), records: 12 });

    let records: Value = serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 12);
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record["client"], "Acme");
        assert_eq!(record["cargo"], "coal");
        assert_eq!(record["department"], "DKP");
        assert_eq!(record["year"], 2024);
        assert_eq!(record["month"], index as u64 + 1);
        assert_eq!(record["month_string"], MONTHS[index]);
        assert_eq!(record["date"], format!("2024-{:02}-01", index + 1));
        assert_eq!(record["container_count"], index as u64 + 1);
        assert_eq!(record["teu"], Value::Null);
        assert_eq!(record["original_file_name"], "DKP_Report_2024.xlsx");
    }
    let parsed_on = &records[0]["original_file_parsed_on"];
    assert!(records.iter().all(|record| &record["original_file_parsed_on"] == parsed_on));
    let notifications = recorder.0.lock().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, Severity::Info);
    assert!(notifications[0].1.contains("12 records"));
}

#[test]
fn block_at_first_column_with_eight_globals() {
    let mut blocks = vec![String::new(); 20];
    blocks[0] = "VOLUMES".to_owned();
    let mut header: Vec<String> = MONTHS.iter().map(|month| month.to_string()).collect();
    header.extend(GLOBALS.iter().map(|id| id.to_string()));
    let mut data: Vec<String> = (1..=12).map(|value| (value * 10).to_string()).collect();
    data.extend(["Acme", "-", "-", "coal", "export", "-", "own", "40"].map(str::to_owned));

    let recorder = Recorder::default();
    let directory = tempfile::tempdir().unwrap();
    let mut context = Context {
        schema: schema_with(&GLOBALS),
        grid_source: Box::new(FixedGrid(Grid::from_texts(&[blocks, header, data]))),
        notifier: Box::new(recorder.clone()),
        header_threshold: 3,
    };

    let outcome = rusty_plan::run(Path::new("DKP_Report_2024.xlsx"), directory.path(), &mut context);
    let output = directory.path().join("DKP_Report_2024.xlsx.json");
    assert_eq!(outcome, RunOutcome::Success { output: output.clone(), records: 12 });

    let records: Value = serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(records[0]["container_count"], 10);
    assert_eq!(records[11]["container_count"], 120);
    assert_eq!(records[11]["client"], "Acme");
    assert_eq!(records[11]["container_size"], 40);
    assert_eq!(records[11]["direction"], "export");
}

#[test]
fn altered_client_header_is_a_schema_mismatch() {
    let recorder = Recorder::default();
    let directory = tempfile::tempdir().unwrap();
    let mut context = context(grid("customer", "Acme"), &recorder);

    let outcome = rusty_plan::run(Path::new("DKP_Report_2024.xlsx"), directory.path(), &mut context);
    let RunOutcome::Failure(failure) = outcome else { panic!("expected a failure") };
    assert_eq!(failure.kind, ErrorKind::SchemaMismatch);
    assert_eq!(failure.signal, "2");
    assert!(failure.message.contains("client"));
    assert!(!directory.path().join("DKP_Report_2024.xlsx.json").exists());

    let notifications = recorder.0.lock().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, Severity::Error);
}

#[test]
fn blank_clients_give_an_empty_result() {
    let recorder = Recorder::default();
    let directory = tempfile::tempdir().unwrap();
    let mut context = context(grid("client", "   "), &recorder);

    let outcome = rusty_plan::run(Path::new("DKP_Report_2024.xlsx"), directory.path(), &mut context);
    assert_eq!(outcome.exit_code(), 4);
    let RunOutcome::Failure(failure) = outcome else { panic!("expected a failure") };
    assert_eq!(failure.kind, ErrorKind::EmptyResult);
    assert_eq!(failure.signal, "4");
    assert!(std::fs::read_dir(directory.path()).unwrap().next().is_none());
}

#[test]
fn missing_year_is_reported_before_reading() {
    let recorder = Recorder::default();
    let directory = tempfile::tempdir().unwrap();
    let mut context = context(grid("client", "Acme"), &recorder);

    let outcome = rusty_plan::run(Path::new("DKP_Report.xlsx"), directory.path(), &mut context);
    let RunOutcome::Failure(failure) = outcome else { panic!("expected a failure") };
    assert_eq!(failure.kind, ErrorKind::FilenameMetadataMissing(MetadataElement::Year));
    assert_eq!(failure.kind.exit_code(), 1);
}

/// Builds a one-sheet workbook from rows of inline strings.
fn workbook(sheet_name: &str, rows: &[Vec<String>]) -> Vec<u8> {
    let mut sheet_data = String::new();
    for (index, row) in rows.iter().enumerate() {
        sheet_data.push_str(&format!("<row r=\"{}\">", index + 1));
        for cell in row {
            sheet_data.push_str(&format!("<c t=\"inlineStr\"><is><t>{cell}</t></is></c>"));
        }
        sheet_data.push_str("</row>");
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    writer.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();
    writer.start_file("xl/workbook.xml", options).unwrap();
    write!(writer, r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{sheet_name}" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();
    writer.start_file("xl/worksheets/sheet1.xml", options).unwrap();
    write!(writer, r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#).unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn builtin_schema_reads_a_sales_plan_workbook() {
    let schema = BuiltinSchema.load().unwrap();

    // Globals first, then each block's title above its own columns
    let mut titles = Vec::new();
    let mut headers = Vec::new();
    let mut data = Vec::new();
    for header in &schema.fields {
        titles.push(String::new());
        headers.push(header.spellings[0].to_owned());
        data.push(match header.id.as_str() {
            "client" => "ООО Ромашка".to_owned(),
            "container_size" => "40".to_owned(),
            _ => "-".to_owned(),
        });
    }
    for block in &schema.blocks {
        titles.push(block.spellings[0].to_owned());
        if block.fields.is_empty() {
            headers.push(String::new());
            data.push(String::new());
        }
        for (index, header) in block.fields.iter().enumerate() {
            if index > 0 {
                titles.push(String::new());
            }
            headers.push(header.spellings[0].to_owned());
            data.push(match block.id.as_str() {
                "natural_indicators_ktk" => (index + 1).to_string(),
                "natural_indicators_teus" => format!("{}.5", index + 1),
                _ => "да".to_owned(),
            });
        }
    }
    let rows = vec![
        vec!["План продаж".to_owned()],
        titles,
        headers,
        data,
    ];

    let directory = tempfile::tempdir().unwrap();
    let document = directory.path().join("ДКП_ЮФО План 2025.xlsx");
    std::fs::write(&document, workbook("ПЛАН ПРОДАЖ", &rows)).unwrap();

    let recorder = Recorder::default();
    let mut context = Context {
        schema,
        grid_source: Box::new(WorkbookGridSource::new(false)),
        notifier: Box::new(recorder.clone()),
        header_threshold: 3,
    };
    let output_dir = tempfile::tempdir().unwrap();
    let outcome = rusty_plan::run(&document, output_dir.path(), &mut context);
    assert_eq!(outcome.exit_code(), 0, "{outcome:?}");

    let output = output_dir.path().join("ДКП_ЮФО План 2025.xlsx.json");
    let records: Value = serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 12);
    assert_eq!(records[0]["department"], "ДКП_ЮФО");
    assert_eq!(records[0]["year"], 2025);
    assert_eq!(records[0]["client"], "ООО Ромашка");
    assert_eq!(records[0]["container_size"], 40);
    assert_eq!(records[0]["service_port"], true);
    assert_eq!(records[4]["month_string"], "май");
    assert_eq!(records[4]["container_count"], 5);
    assert_eq!(records[11]["teu"], 12.5);
    assert_eq!(records[11]["date"], "2025-12-01");
}
