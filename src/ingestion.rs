use crate::error::{Result, StatementError};
use crate::schema::ProcessingConfig;
use csv::ReaderBuilder;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A named table of untyped cells, as handed over by whatever read the
/// source file. Headers are stored trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        Self {
            name: name.into(),
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    /// Reads a CSV source whose first record is the header line.
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::new(name, headers, rows);
        debug!(
            "Read table '{}' with {} columns and {} rows",
            table.name,
            table.headers.len(),
            table.rows.len()
        );
        Ok(table)
    }

    pub fn from_csv_path(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(name, file)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        let wanted = column.trim();
        self.headers.iter().position(|h| h == wanted)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }
}

/// The set of named tables making up one imported file.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    tables: BTreeMap<String, RawTable>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: RawTable) {
        self.tables.insert(table.name.trim().to_string(), table);
    }

    pub fn with_table(mut self, table: RawTable) -> Self {
        self.insert(table);
        self
    }

    pub fn table(&self, name: &str) -> Result<&RawTable> {
        self.tables
            .get(name.trim())
            .ok_or_else(|| StatementError::MissingSheet(name.to_string()))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Builds the two-table workbook (chart of accounts, general ledger) from
    /// CSV sources, naming the tables after the configured sheets.
    pub fn from_csv_readers<C: Read, L: Read>(
        config: &ProcessingConfig,
        chart: C,
        ledger: L,
    ) -> Result<Self> {
        let workbook = Self::new()
            .with_table(RawTable::from_csv_reader(&config.chart_sheet, chart)?)
            .with_table(RawTable::from_csv_reader(&config.ledger_sheet, ledger)?);
        info!(
            "Loaded workbook with sheets: {}",
            workbook.sheet_names().collect::<Vec<_>>().join(", ")
        );
        Ok(workbook)
    }

    pub fn from_csv_files(
        config: &ProcessingConfig,
        chart_path: impl AsRef<Path>,
        ledger_path: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::from_csv_readers(config, File::open(chart_path)?, File::open(ledger_path)?)
    }
}

/// Positions of named columns within a table, resolved once so rows can be
/// read by name regardless of column order.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    indices: HashMap<&'static str, usize>,
}

impl ColumnMap {
    /// Fails with a single error naming every absent required column.
    /// Absent optional columns are simply not mapped.
    pub fn resolve(
        table: &RawTable,
        required: &[&'static str],
        optional: &[&'static str],
    ) -> Result<Self> {
        let missing: Vec<String> = required
            .iter()
            .filter(|column| !table.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(StatementError::MissingColumns {
                sheet: table.name.clone(),
                columns: missing,
            });
        }

        let indices = required
            .iter()
            .chain(optional.iter())
            .filter_map(|column| table.column_index(column).map(|idx| (*column, idx)))
            .collect();

        Ok(Self { indices })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.indices.contains_key(column)
    }

    /// Cell of `row` under `column`, or "" when the column is unmapped.
    pub fn get<'r>(&self, row: &'r [String], column: &str) -> &'r str {
        self.indices
            .get(column)
            .and_then(|&idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn mapped_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.values().copied()
    }
}
