//! Ledger normalization: turns the raw "Grand Livre" table into typed
//! entries without ever dropping a row. Cells that fail to parse are kept as
//! [`ParsedCell::Unparsed`] and reported as [`CoercionWarning`]s.

use crate::error::Result;
use crate::ingestion::{ColumnMap, RawTable};
use crate::schema::ProcessingConfig;
use crate::utils::{normalize_account_code, parse_date_flexible, parse_decimal_strict, period_key};
use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const COL_DATE: &str = "Date";
pub const COL_JOURNAL: &str = "Journal";
pub const COL_OPENING: &str = "AN";
pub const COL_ACCOUNT: &str = "Compte";
pub const COL_LABEL: &str = "Libellé";
pub const COL_DEBIT: &str = "Débit";
pub const COL_CREDIT: &str = "Crédit";
pub const COL_REFERENCE: &str = "Référence";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_DATE,
    COL_JOURNAL,
    COL_OPENING,
    COL_ACCOUNT,
    COL_LABEL,
    COL_DEBIT,
    COL_CREDIT,
];
const OPTIONAL_COLUMNS: &[&str] = &[COL_REFERENCE];

/// Result of parsing one cell: a strict parse either succeeds, finds the
/// cell empty, or fails and keeps the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedCell<T> {
    Value(T),
    Missing,
    Unparsed(String),
}

impl<T> ParsedCell<T> {
    pub fn parse_with(raw: &str, parser: impl FnOnce(&str) -> Option<T>) -> Self {
        if raw.trim().is_empty() {
            return Self::Missing;
        }
        match parser(raw) {
            Some(value) => Self::Value(value),
            None => Self::Unparsed(raw.to_string()),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Self::Unparsed(_))
    }
}

impl ParsedCell<Decimal> {
    pub fn value_or_zero(&self) -> Decimal {
        self.value().copied().unwrap_or(Decimal::ZERO)
    }
}

/// A cell that could not be coerced. The row stays in the ledger with the
/// affected field degraded (no year, or a zero amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    /// 1-based data row within the ledger table.
    pub row: usize,
    pub column: String,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: ParsedCell<NaiveDate>,
    pub journal: String,
    /// Raw AN flag; see [`ProcessingConfig::is_opening_flag`].
    pub opening_flag: String,
    pub account: String,
    pub label: String,
    pub debit: ParsedCell<Decimal>,
    pub credit: ParsedCell<Decimal>,
    pub reference: Option<String>,
    /// Columns the ledger carries beyond the known ones, verbatim.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl LedgerEntry {
    pub fn new(date: NaiveDate, opening_flag: &str, account: &str, debit: Decimal, credit: Decimal) -> Self {
        Self {
            date: ParsedCell::Value(date),
            journal: String::new(),
            opening_flag: opening_flag.to_string(),
            account: normalize_account_code(account),
            label: String::new(),
            debit: ParsedCell::Value(debit),
            credit: ParsedCell::Value(credit),
            reference: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = journal.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Fiscal year ("Année"): calendar year of the posting date.
    pub fn fiscal_year(&self) -> Option<i32> {
        self.date.value().map(|d| d.year())
    }

    /// Fiscal year as displayed, 0 when the date did not parse.
    pub fn fiscal_year_or_zero(&self) -> i32 {
        self.fiscal_year().unwrap_or(0)
    }

    /// Period key ("Mois"): `YYYYMM`, empty when the date did not parse.
    pub fn period(&self) -> String {
        self.date.value().map(|d| period_key(*d)).unwrap_or_default()
    }

    pub fn debit_amount(&self) -> Decimal {
        self.debit.value_or_zero()
    }

    pub fn credit_amount(&self) -> Decimal {
        self.credit.value_or_zero()
    }

    pub fn is_opening(&self, config: &ProcessingConfig) -> bool {
        config.is_opening_flag(&self.opening_flag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralLedger {
    pub entries: Vec<LedgerEntry>,
    /// Names of the extra columns present in the source table.
    pub extra_columns: Vec<String>,
    pub warnings: Vec<CoercionWarning>,
}

impl GeneralLedger {
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        Self {
            entries,
            extra_columns: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.extra_columns.iter().any(|c| c == column.trim())
    }

    /// Distinct fiscal years with at least one dated entry, ascending.
    pub fn fiscal_years(&self) -> Vec<i32> {
        self.entries
            .iter()
            .filter_map(LedgerEntry::fiscal_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Normalizes the raw ledger table.
///
/// Only structural problems fail: a missing required column yields
/// `MissingColumns`. Bad dates and amounts degrade the field and are listed
/// in [`GeneralLedger::warnings`].
pub fn normalize_ledger(table: &RawTable, config: &ProcessingConfig) -> Result<GeneralLedger> {
    let columns = ColumnMap::resolve(table, REQUIRED_COLUMNS, OPTIONAL_COLUMNS)?;

    let known: BTreeSet<usize> = columns.mapped_indices().collect();
    let extra_columns: Vec<(usize, String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, header)| !known.contains(idx) && !header.is_empty())
        .map(|(idx, header)| (idx, header.clone()))
        .collect();

    let mut entries = Vec::with_capacity(table.rows.len());
    let mut warnings = Vec::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_number = row_idx + 1;

        let date = ParsedCell::parse_with(columns.get(row, COL_DATE), |raw| {
            parse_date_flexible(raw, &config.date_formats, config.spreadsheet_serial_dates)
        });
        let debit = ParsedCell::parse_with(columns.get(row, COL_DEBIT), parse_decimal_strict);
        let credit = ParsedCell::parse_with(columns.get(row, COL_CREDIT), parse_decimal_strict);

        for (column, cell) in [
            (COL_DATE, unparsed_raw(&date)),
            (COL_DEBIT, unparsed_raw(&debit)),
            (COL_CREDIT, unparsed_raw(&credit)),
        ] {
            if let Some(raw) = cell {
                debug!("Row {}: could not parse {} value '{}'", row_number, column, raw);
                warnings.push(CoercionWarning {
                    row: row_number,
                    column: column.to_string(),
                    raw: raw.to_string(),
                });
            }
        }

        let reference = Some(columns.get(row, COL_REFERENCE).trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let extra = extra_columns
            .iter()
            .map(|(idx, name)| (name.clone(), row.get(*idx).cloned().unwrap_or_default()))
            .collect();

        entries.push(LedgerEntry {
            date,
            journal: columns.get(row, COL_JOURNAL).trim().to_string(),
            opening_flag: columns.get(row, COL_OPENING).trim().to_string(),
            account: normalize_account_code(columns.get(row, COL_ACCOUNT)),
            label: columns.get(row, COL_LABEL).trim().to_string(),
            debit,
            credit,
            reference,
            extra,
        });
    }

    if !warnings.is_empty() {
        warn!(
            "{} ledger cell(s) could not be parsed and were degraded",
            warnings.len()
        );
    }
    info!("General ledger normalized: {} entries", entries.len());

    Ok(GeneralLedger {
        entries,
        extra_columns: extra_columns.into_iter().map(|(_, name)| name).collect(),
        warnings,
    })
}

fn unparsed_raw<T>(cell: &ParsedCell<T>) -> Option<&str> {
    match cell {
        ParsedCell::Unparsed(raw) => Some(raw),
        _ => None,
    }
}
