//! CSV and Markdown renderings of the computed tables.
//!
//! Amounts are written as integers with space thousands grouping
//! (`1 234 567`), the way the statements are presented.

use crate::chart_of_accounts::{
    COL_BALANCE_CREDIT, COL_BALANCE_DEBIT, COL_CODE, COL_GROUP, COL_LABEL, COL_RESULT_CREDIT,
    COL_RESULT_DEBIT,
};
use crate::engine::{AccountBalance, BalanceAmounts, TrialBalance};
use crate::error::{Result, StatementError};
use crate::ledger::{LedgerEntry, ParsedCell};
use crate::ledger_view::LedgerView;
use crate::statements::{ComparativeStatement, StatementLine};
use crate::utils::format_thousands;
use csv::Writer;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const COMBINED_SHEET: &str = "Balance_Toutes_Classes";
pub const TOTAL_LABEL: &str = "Total";

const BALANCE_HEADERS: [&str; 15] = [
    COL_CODE,
    COL_LABEL,
    COL_GROUP,
    COL_BALANCE_DEBIT,
    COL_BALANCE_CREDIT,
    COL_RESULT_DEBIT,
    COL_RESULT_CREDIT,
    "SI Débit",
    "SI Crédit",
    "Mouv Débit",
    "Mouv Crédit",
    "SF Débit",
    "SF Crédit",
    "Code Bilan",
    "Code Résultat",
];

const LEDGER_HEADERS: [&str; 10] = [
    "Date", "Journal", "AN", "Compte", "Libellé", "Débit", "Crédit", "Référence", "Année", "Mois",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceLayout {
    /// Every row on one sheet.
    #[default]
    Combined,
    /// One sheet per account class, each with its own total row.
    ByClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSheet {
    pub name: String,
    pub csv: String,
}

pub fn class_sheet_name(class: char) -> String {
    format!("Classe_{}", class)
}

/// Renders the trial balance as one or more CSV sheets.
///
/// With [`BalanceLayout::ByClass`] the classes come from the balance's
/// selection, or from the rows themselves when no class filter was set.
pub fn export_trial_balance(balance: &TrialBalance, layout: BalanceLayout) -> Result<Vec<ExportSheet>> {
    match layout {
        BalanceLayout::Combined => Ok(vec![ExportSheet {
            name: COMBINED_SHEET.to_string(),
            csv: balance_rows_to_csv(balance.rows.iter(), &balance.totals)?,
        }]),
        BalanceLayout::ByClass => {
            let classes: BTreeSet<char> = match &balance.selection.classes {
                Some(classes) => classes.clone(),
                None => balance.rows.iter().filter_map(|r| r.code.chars().next()).collect(),
            };

            let mut sheets = Vec::with_capacity(classes.len());
            for class in classes {
                let rows: Vec<&AccountBalance> = balance.rows_in_class(class).collect();
                let totals = BalanceAmounts::checked_total(rows.iter().map(|r| &r.amounts))
                    .ok_or_else(|| StatementError::AmountOverflow {
                        scope: format!("class {} of the {} trial balance", class, balance.year),
                    })?;
                debug!("Exporting class {} ({} rows)", class, rows.len());
                sheets.push(ExportSheet {
                    name: class_sheet_name(class),
                    csv: balance_rows_to_csv(rows.into_iter(), &totals)?,
                });
            }
            Ok(sheets)
        }
    }
}

fn balance_rows_to_csv<'a>(
    rows: impl Iterator<Item = &'a AccountBalance>,
    totals: &BalanceAmounts,
) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(BALANCE_HEADERS)?;

    for row in rows {
        let m = &row.mappings;
        let mut record = vec![
            row.code.clone(),
            row.label.clone(),
            row.group.to_string(),
            m.balance_debit.clone().unwrap_or_default(),
            m.balance_credit.clone().unwrap_or_default(),
            m.result_debit.clone().unwrap_or_default(),
            m.result_credit.clone().unwrap_or_default(),
        ];
        record.extend(amount_cells(&row.amounts));
        record.push(row.balance_sheet_code().unwrap_or_default().to_string());
        record.push(row.result_code().unwrap_or_default().to_string());
        writer.write_record(&record)?;
    }

    let mut total = vec![TOTAL_LABEL.to_string()];
    total.extend(std::iter::repeat(String::new()).take(6));
    total.extend(amount_cells(totals));
    total.extend([String::new(), String::new()]);
    writer.write_record(&total)?;

    finish(writer)
}

fn amount_cells(amounts: &BalanceAmounts) -> [String; 6] {
    [
        amounts.opening_debit,
        amounts.opening_credit,
        amounts.movement_debit,
        amounts.movement_credit,
        amounts.closing_debit,
        amounts.closing_credit,
    ]
    .map(format_thousands)
}

/// Renders the filtered ledger, followed by a total row.
pub fn ledger_view_to_csv(view: &LedgerView) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(LEDGER_HEADERS)?;

    for entry in &view.entries {
        writer.write_record([
            date_cell(entry),
            entry.journal.clone(),
            entry.opening_flag.clone(),
            entry.account.clone(),
            entry.label.clone(),
            format_thousands(entry.debit_amount()),
            format_thousands(entry.credit_amount()),
            entry.reference.clone().unwrap_or_default(),
            entry.fiscal_year_or_zero().to_string(),
            entry.period(),
        ])?;
    }

    writer.write_record([
        TOTAL_LABEL.to_string(),
        String::new(),
        String::new(),
        String::new(),
        view.observation.to_string(),
        format_thousands(view.total_debit),
        format_thousands(view.total_credit),
        String::new(),
        String::new(),
        String::new(),
    ])?;

    finish(writer)
}

fn date_cell(entry: &LedgerEntry) -> String {
    match &entry.date {
        ParsedCell::Value(date) => date.format("%d/%m/%Y").to_string(),
        ParsedCell::Missing => String::new(),
        ParsedCell::Unparsed(raw) => raw.clone(),
    }
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| StatementError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn statement_to_markdown(statement: &ComparativeStatement) -> String {
    let mut output = format!("# {}\n\n", statement.kind.title());

    for section in &statement.sections {
        output.push_str(&format!("## {}\n\n", section.side.title()));
        output.push_str(&format!(
            "| Code | Libellé | {} | {} |\n",
            statement.current_year, statement.previous_year
        ));
        output.push_str("|---|---|---:|---:|\n");
        for line in &section.lines {
            output.push_str(&markdown_line(line));
        }
        output.push('\n');
    }

    output
}

fn markdown_line(line: &StatementLine) -> String {
    let label = if line.is_subtotal {
        format!("**{}**", line.label)
    } else {
        line.label.to_string()
    };
    format!(
        "| {} | {} | {} | {} |\n",
        line.code,
        label,
        blank_or_amount(line.current),
        blank_or_amount(line.previous)
    )
}

fn blank_or_amount(amount: Option<Decimal>) -> String {
    amount.map(format_thousands).unwrap_or_default()
}
