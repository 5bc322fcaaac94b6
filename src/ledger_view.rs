//! Filtered listing of the general ledger with debit/credit totals.

use crate::error::{Result, StatementError};
use crate::ledger::{GeneralLedger, LedgerEntry};
use crate::utils::checked_sum;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Each set restricts entries to the listed values; an empty set does not
/// filter. Sets are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerFilter {
    pub journals: BTreeSet<String>,
    /// Raw AN values, compared as written in the ledger.
    pub opening_flags: BTreeSet<String>,
    pub accounts: BTreeSet<String>,
    /// Fiscal years; 0 selects entries whose date did not parse.
    pub years: BTreeSet<i32>,
    /// `YYYYMM` keys.
    pub periods: BTreeSet<String>,
}

impl LedgerFilter {
    pub fn with_journals<I, S>(mut self, journals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.journals = journals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_opening_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opening_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_periods<I, S>(mut self, periods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.periods = periods.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        allows(&self.journals, &entry.journal)
            && allows(&self.opening_flags, &entry.opening_flag)
            && allows(&self.accounts, &entry.account)
            && (self.years.is_empty() || self.years.contains(&entry.fiscal_year_or_zero()))
            && allows(&self.periods, &entry.period())
    }
}

fn allows(set: &BTreeSet<String>, value: &str) -> bool {
    set.is_empty() || set.contains(value)
}

/// Distinct values available for each filter, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerFilterOptions {
    pub journals: BTreeSet<String>,
    pub opening_flags: BTreeSet<String>,
    pub accounts: BTreeSet<String>,
    pub years: BTreeSet<i32>,
    pub periods: BTreeSet<String>,
}

impl LedgerFilterOptions {
    pub fn from_ledger(ledger: &GeneralLedger) -> Self {
        let mut options = Self::default();
        for entry in &ledger.entries {
            if !entry.journal.is_empty() {
                options.journals.insert(entry.journal.clone());
            }
            if !entry.opening_flag.is_empty() {
                options.opening_flags.insert(entry.opening_flag.clone());
            }
            if !entry.account.is_empty() {
                options.accounts.insert(entry.account.clone());
            }
            options.years.insert(entry.fiscal_year_or_zero());
            let period = entry.period();
            if !period.is_empty() {
                options.periods.insert(period);
            }
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceObservation {
    Settled,
    DebitBalance,
    CreditBalance,
}

impl BalanceObservation {
    pub fn from_difference(difference: Decimal) -> Self {
        if difference.is_zero() {
            Self::Settled
        } else if difference > Decimal::ZERO {
            Self::DebitBalance
        } else {
            Self::CreditBalance
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Settled => "RAS",
            Self::DebitBalance => "Solde Débiteur",
            Self::CreditBalance => "Solde Créditeur",
        }
    }
}

impl fmt::Display for BalanceObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerView {
    pub entries: Vec<LedgerEntry>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Total debit minus total credit.
    pub difference: Decimal,
    pub observation: BalanceObservation,
}

impl LedgerView {
    pub fn build(ledger: &GeneralLedger, filter: &LedgerFilter) -> Result<Self> {
        let entries: Vec<LedgerEntry> = ledger
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();

        let total_debit = checked_sum(entries.iter().map(LedgerEntry::debit_amount))
            .ok_or_else(|| overflow("ledger view debits"))?;
        let total_credit = checked_sum(entries.iter().map(LedgerEntry::credit_amount))
            .ok_or_else(|| overflow("ledger view credits"))?;
        let difference = total_debit
            .checked_sub(total_credit)
            .ok_or_else(|| overflow("ledger view difference"))?;

        debug!(
            "Ledger view: {} of {} entries, difference {}",
            entries.len(),
            ledger.len(),
            difference
        );

        Ok(Self {
            entries,
            total_debit,
            total_credit,
            difference,
            observation: BalanceObservation::from_difference(difference),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn overflow(scope: &str) -> StatementError {
    StatementError::AmountOverflow {
        scope: scope.to_string(),
    }
}
