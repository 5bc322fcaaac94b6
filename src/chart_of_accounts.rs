use crate::error::{Result, StatementError};
use crate::ingestion::{ColumnMap, RawTable};
use crate::schema::{AccountSelection, StatementGroup};
use crate::utils::{account_class, normalize_account_code};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const COL_CODE: &str = "Compte";
pub const COL_LABEL: &str = "Intitulé";
pub const COL_GROUP: &str = "Tableau";
pub const COL_BALANCE_DEBIT: &str = "BD";
pub const COL_BALANCE_CREDIT: &str = "BC";
pub const COL_RESULT_DEBIT: &str = "RD";
pub const COL_RESULT_CREDIT: &str = "RC";

const REQUIRED_COLUMNS: &[&str] = &[COL_CODE, COL_LABEL, COL_GROUP];
const OPTIONAL_COLUMNS: &[&str] = &[
    COL_BALANCE_DEBIT,
    COL_BALANCE_CREDIT,
    COL_RESULT_DEBIT,
    COL_RESULT_CREDIT,
];

/// Statement line codes an account's closing balance is routed to,
/// depending on its statement group and the side of the balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingCodes {
    pub balance_debit: Option<String>,
    pub balance_credit: Option<String>,
    pub result_debit: Option<String>,
    pub result_credit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub label: String,
    pub group: StatementGroup,
    pub mappings: MappingCodes,
}

impl Account {
    pub fn new(code: &str, label: impl Into<String>, group: StatementGroup) -> Self {
        Self {
            code: normalize_account_code(code),
            label: label.into(),
            group,
            mappings: MappingCodes::default(),
        }
    }

    pub fn with_mappings(mut self, mappings: MappingCodes) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn class(&self) -> Option<char> {
        account_class(&self.code)
    }
}

/// The account registry: every account of the imported chart, in file
/// order, indexed by normalized code.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: Vec<Account>,
    source_rows: Vec<usize>,
    index: HashMap<String, usize>,
}

impl ChartOfAccounts {
    pub fn new(accounts: Vec<Account>) -> Result<Self> {
        let mut chart = Self::default();
        for (idx, account) in accounts.into_iter().enumerate() {
            chart.push(account, idx + 1)?;
        }
        Ok(chart)
    }

    /// Reads the "Plan de comptes" table. `Compte`, `Intitulé` and `Tableau`
    /// are required; the four mapping columns may be absent.
    pub fn from_table(table: &RawTable) -> Result<Self> {
        let columns = ColumnMap::resolve(table, REQUIRED_COLUMNS, OPTIONAL_COLUMNS)?;
        let mut chart = Self::default();

        for (row_idx, row) in table.rows.iter().enumerate() {
            let code = normalize_account_code(columns.get(row, COL_CODE));
            if code.is_empty() {
                debug!("Skipping chart row {} without an account code", row_idx + 1);
                continue;
            }

            let account = Account {
                code,
                label: columns.get(row, COL_LABEL).trim().to_string(),
                group: StatementGroup::parse(columns.get(row, COL_GROUP)),
                mappings: MappingCodes {
                    balance_debit: mapping_cell(columns.get(row, COL_BALANCE_DEBIT)),
                    balance_credit: mapping_cell(columns.get(row, COL_BALANCE_CREDIT)),
                    result_debit: mapping_cell(columns.get(row, COL_RESULT_DEBIT)),
                    result_credit: mapping_cell(columns.get(row, COL_RESULT_CREDIT)),
                },
            };
            chart.push(account, row_idx + 1)?;
        }

        info!("Chart of accounts loaded with {} accounts", chart.len());
        Ok(chart)
    }

    fn push(&mut self, account: Account, row: usize) -> Result<()> {
        if let Some(&existing) = self.index.get(&account.code) {
            return Err(StatementError::DuplicateAccount {
                code: account.code,
                first_row: self.source_rows[existing],
                second_row: row,
            });
        }
        self.index.insert(account.code.clone(), self.accounts.len());
        self.accounts.push(account);
        self.source_rows.push(row);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.index
            .get(&normalize_account_code(code))
            .map(|&idx| &self.accounts[idx])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Accounts kept by `selection`, in chart order.
    pub fn select<'a>(&'a self, selection: &'a AccountSelection) -> impl Iterator<Item = &'a Account> + 'a {
        self.accounts
            .iter()
            .filter(move |a| selection.includes_class(a.class()) && selection.includes_group(&a.group))
    }

    /// Distinct, non-blank statement groups, sorted.
    pub fn statement_groups(&self) -> Vec<String> {
        self.accounts
            .iter()
            .filter(|a| !a.group.is_blank())
            .map(|a| a.group.as_str().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct account classes (first digit of the code), sorted.
    pub fn classes(&self) -> Vec<char> {
        self.accounts
            .iter()
            .filter_map(Account::class)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.accounts)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            COL_CODE,
            COL_LABEL,
            COL_GROUP,
            COL_BALANCE_DEBIT,
            COL_BALANCE_CREDIT,
            COL_RESULT_DEBIT,
            COL_RESULT_CREDIT,
        ])?;

        for account in &self.accounts {
            let m = &account.mappings;
            writer.write_record([
                account.code.as_str(),
                account.label.as_str(),
                account.group.as_str(),
                m.balance_debit.as_deref().unwrap_or(""),
                m.balance_credit.as_deref().unwrap_or(""),
                m.result_debit.as_deref().unwrap_or(""),
                m.result_credit.as_deref().unwrap_or(""),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| StatementError::IoError(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("# Plan de comptes\n\n");

        for group in self.statement_groups() {
            output.push_str(&format!("## {}\n\n", group));
            for account in self.accounts.iter().filter(|a| a.group.as_str() == group) {
                output.push_str(&format!("- {} {}\n", account.code, account.label));
            }
            output.push('\n');
        }

        output
    }
}

fn mapping_cell(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
