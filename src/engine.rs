use crate::chart_of_accounts::{Account, ChartOfAccounts, MappingCodes};
use crate::error::{Result, StatementError};
use crate::ledger::{GeneralLedger, LedgerEntry};
use crate::schema::{AccountSelection, ProcessingConfig, StatementGroup, YearColumn};
use crate::utils::parse_decimal_strict;
use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The six amount columns of the eight-column trial balance
/// (SI, Mouv and SF, each split debit/credit).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAmounts {
    pub opening_debit: Decimal,
    pub opening_credit: Decimal,
    pub movement_debit: Decimal,
    pub movement_credit: Decimal,
    pub closing_debit: Decimal,
    pub closing_credit: Decimal,
}

impl BalanceAmounts {
    /// Derives the closing columns from opening and movement sums. Only the
    /// net side survives; a net of exactly zero leaves both closing columns
    /// at zero. `None` when the net does not fit in a `Decimal`.
    pub fn from_activity(
        opening_debit: Decimal,
        opening_credit: Decimal,
        movement_debit: Decimal,
        movement_credit: Decimal,
    ) -> Option<Self> {
        let debit = opening_debit.checked_add(movement_debit)?;
        let credit = opening_credit.checked_add(movement_credit)?;
        let net = debit.checked_sub(credit)?;
        Some(Self {
            opening_debit,
            opening_credit,
            movement_debit,
            movement_credit,
            closing_debit: net.max(Decimal::ZERO),
            closing_credit: (-net).max(Decimal::ZERO),
        })
    }

    /// The nonzero closing value (at most one side is nonzero).
    pub fn closing_amount(&self) -> Decimal {
        self.closing_debit + self.closing_credit
    }

    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        Some(Self {
            opening_debit: self.opening_debit.checked_add(rhs.opening_debit)?,
            opening_credit: self.opening_credit.checked_add(rhs.opening_credit)?,
            movement_debit: self.movement_debit.checked_add(rhs.movement_debit)?,
            movement_credit: self.movement_credit.checked_add(rhs.movement_credit)?,
            closing_debit: self.closing_debit.checked_add(rhs.closing_debit)?,
            closing_credit: self.closing_credit.checked_add(rhs.closing_credit)?,
        })
    }

    /// Column-wise total, `None` on overflow.
    pub fn checked_total<'a>(amounts: impl IntoIterator<Item = &'a BalanceAmounts>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::default(), |acc, amounts| acc.checked_add(amounts))
    }
}

/// Statement line an account's closing balance is routed to. Carrying the
/// statement in the variant means an account never holds both a balance
/// sheet code and a result code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "statement", content = "code")]
pub enum AssignedCode {
    BalanceSheet(String),
    Result(String),
}

impl AssignedCode {
    pub fn code(&self) -> &str {
        match self {
            Self::BalanceSheet(code) | Self::Result(code) => code,
        }
    }
}

/// One row of the trial balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub code: String,
    pub label: String,
    pub group: StatementGroup,
    pub mappings: MappingCodes,
    pub amounts: BalanceAmounts,
    pub assigned: Option<AssignedCode>,
}

impl AccountBalance {
    /// "Code Bilan" column.
    pub fn balance_sheet_code(&self) -> Option<&str> {
        match &self.assigned {
            Some(AssignedCode::BalanceSheet(code)) => Some(code),
            _ => None,
        }
    }

    /// "Code Résultat" column.
    pub fn result_code(&self) -> Option<&str> {
        match &self.assigned {
            Some(AssignedCode::Result(code)) => Some(code),
            _ => None,
        }
    }
}

/// Trial balance of one fiscal year for one account selection and year
/// source. The totals row is kept apart from the account rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub year: i32,
    pub selection: AccountSelection,
    #[serde(default)]
    pub year_column: YearColumn,
    pub rows: Vec<AccountBalance>,
    pub totals: BalanceAmounts,
}

impl TrialBalance {
    /// Total closing debit minus total closing credit. Nonzero whenever the
    /// underlying ledger (or the selected part of it) is not balanced.
    pub fn imbalance(&self) -> Decimal {
        self.totals.closing_debit - self.totals.closing_credit
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }

    pub fn row(&self, code: &str) -> Option<&AccountBalance> {
        self.rows.iter().find(|r| r.code == code)
    }

    /// Rows whose account code starts with `class`.
    pub fn rows_in_class(&self, class: char) -> impl Iterator<Item = &AccountBalance> {
        self.rows.iter().filter(move |r| r.code.starts_with(class))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub year: i32,
    #[serde(default)]
    pub selection: AccountSelection,
    #[serde(default)]
    pub year_column: YearColumn,
}

impl BalanceRequest {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            selection: AccountSelection::default(),
            year_column: YearColumn::Derived,
        }
    }

    pub fn with_selection(mut self, selection: AccountSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_year_column(mut self, year_column: YearColumn) -> Self {
        self.year_column = year_column;
        self
    }
}

#[derive(Default)]
struct Activity {
    opening_debit: Decimal,
    opening_credit: Decimal,
    movement_debit: Decimal,
    movement_credit: Decimal,
}

impl Activity {
    fn record(&mut self, opening: bool, debit: Decimal, credit: Decimal) -> Option<()> {
        let (debit_sum, credit_sum) = if opening {
            (&mut self.opening_debit, &mut self.opening_credit)
        } else {
            (&mut self.movement_debit, &mut self.movement_credit)
        };
        *debit_sum = debit_sum.checked_add(debit)?;
        *credit_sum = credit_sum.checked_add(credit)?;
        Some(())
    }
}

fn overflow(scope: String) -> StatementError {
    StatementError::AmountOverflow { scope }
}

pub struct BalanceEngine<'a> {
    config: &'a ProcessingConfig,
}

impl<'a> BalanceEngine<'a> {
    pub fn new(config: &'a ProcessingConfig) -> Self {
        Self { config }
    }

    /// Computes the trial balance of `request.year` over the selected
    /// accounts. Ledger entries whose account is not selected (or not in the
    /// chart at all) are ignored; selected accounts without activity appear
    /// with zero balances.
    pub fn compute(
        &self,
        ledger: &GeneralLedger,
        chart: &ChartOfAccounts,
        request: &BalanceRequest,
    ) -> Result<TrialBalance> {
        if let YearColumn::Named(column) = &request.year_column {
            if !ledger.has_column(column) {
                return Err(StatementError::MissingYearColumn(column.clone()));
            }
        }

        info!(
            "Computing trial balance for fiscal year {} ({} ledger entries)",
            request.year,
            ledger.len()
        );

        let accounts: Vec<&Account> = chart.select(&request.selection).collect();
        let selected: HashSet<&str> = accounts.iter().map(|a| a.code.as_str()).collect();

        let mut activity: HashMap<&str, Activity> = HashMap::new();
        let mut used = 0usize;
        for entry in &ledger.entries {
            if !selected.contains(entry.account.as_str()) {
                continue;
            }
            if entry_year(entry, &request.year_column) != Some(request.year) {
                continue;
            }

            used += 1;
            activity
                .entry(entry.account.as_str())
                .or_default()
                .record(entry.is_opening(self.config), entry.debit_amount(), entry.credit_amount())
                .ok_or_else(|| overflow(format!("account {}", entry.account)))?;
        }
        debug!(
            "{} of {} ledger entries fall in year {} for {} selected accounts",
            used,
            ledger.len(),
            request.year,
            accounts.len()
        );

        let rows = accounts
            .into_iter()
            .map(|account| {
                let sums = activity.remove(account.code.as_str()).unwrap_or_default();
                let amounts = BalanceAmounts::from_activity(
                    sums.opening_debit,
                    sums.opening_credit,
                    sums.movement_debit,
                    sums.movement_credit,
                )
                .ok_or_else(|| overflow(format!("account {}", account.code)))?;
                Ok(AccountBalance {
                    code: account.code.clone(),
                    label: account.label.clone(),
                    group: account.group.clone(),
                    mappings: account.mappings.clone(),
                    assigned: assign_code(&account.group, &account.mappings, &amounts),
                    amounts,
                })
            })
            .collect::<Result<Vec<AccountBalance>>>()?;

        let totals = BalanceAmounts::checked_total(rows.iter().map(|r| &r.amounts))
            .ok_or_else(|| overflow(format!("the {} trial balance totals", request.year)))?;
        let balance = TrialBalance {
            year: request.year,
            selection: request.selection.clone(),
            year_column: request.year_column.clone(),
            rows,
            totals,
        };

        if !balance.is_balanced() {
            info!(
                "Trial balance {} is not balanced: closing debit exceeds closing credit by {}",
                request.year,
                balance.imbalance()
            );
        }

        Ok(balance)
    }
}

/// Picks the statement line code from the account's mapping codes according
/// to its statement group and the side of its closing balance.
pub fn assign_code(
    group: &StatementGroup,
    mappings: &MappingCodes,
    amounts: &BalanceAmounts,
) -> Option<AssignedCode> {
    let (debit_code, credit_code) = match group {
        StatementGroup::Bilan => (&mappings.balance_debit, &mappings.balance_credit),
        StatementGroup::Resultat => (&mappings.result_debit, &mappings.result_credit),
        StatementGroup::Other(_) => return None,
    };

    let code = if amounts.closing_debit > Decimal::ZERO {
        debit_code
    } else if amounts.closing_credit > Decimal::ZERO {
        credit_code
    } else {
        return None;
    };

    let code = code.as_ref().filter(|c| !c.is_empty())?.clone();
    Some(match group {
        StatementGroup::Bilan => AssignedCode::BalanceSheet(code),
        _ => AssignedCode::Result(code),
    })
}

fn entry_year(entry: &LedgerEntry, year_column: &YearColumn) -> Option<i32> {
    match year_column {
        YearColumn::Derived => entry.fiscal_year(),
        YearColumn::Named(column) => entry
            .extra
            .get(column.trim())
            .and_then(|raw| parse_decimal_strict(raw))
            .and_then(|year| year.trunc().to_i32()),
    }
}

pub fn compute_trial_balance(
    config: &ProcessingConfig,
    ledger: &GeneralLedger,
    chart: &ChartOfAccounts,
    request: &BalanceRequest,
) -> Result<TrialBalance> {
    BalanceEngine::new(config).compute(ledger, chart, request)
}
