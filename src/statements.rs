use crate::cache::{BalanceCache, SnapshotKey};
use crate::engine::{AccountBalance, TrialBalance};
use crate::error::{Result, StatementError};
use crate::schema::{AccountSelection, YearColumn};
use crate::templates::{LineTemplate, StatementKind, StatementSide};
use crate::utils::checked_sum;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeRequest {
    /// Year N.
    pub current_year: i32,
    /// Year N-1.
    pub previous_year: i32,
    #[serde(default)]
    pub selection: AccountSelection,
    /// Both years must have been computed from this year source.
    #[serde(default)]
    pub year_column: YearColumn,
}

impl ComparativeRequest {
    pub fn new(current_year: i32, previous_year: i32) -> Self {
        Self {
            current_year,
            previous_year,
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

    fn snapshot_key(&self, year: i32) -> SnapshotKey {
        SnapshotKey::new(year, self.selection.clone(), self.year_column.clone())
    }

    /// Latest year against the one before it; a single year is compared with
    /// itself.
    pub fn latest(years: &[i32]) -> Option<Self> {
        let mut sorted = years.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        let current = *sorted.first()?;
        let previous = sorted.get(1).copied().unwrap_or(current);
        Some(Self::new(current, previous))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementLine {
    pub code: &'static str,
    pub label: &'static str,
    pub is_subtotal: bool,
    /// `None` renders blank: nothing mapped, or mapped accounts net to zero.
    pub current: Option<Decimal>,
    pub previous: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSection {
    pub side: StatementSide,
    pub lines: Vec<StatementLine>,
}

impl StatementSection {
    pub fn line(&self, code: &str) -> Option<&StatementLine> {
        self.lines.iter().find(|l| l.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeStatement {
    pub kind: StatementKind,
    pub current_year: i32,
    pub previous_year: i32,
    pub sections: Vec<StatementSection>,
}

impl ComparativeStatement {
    pub fn section(&self, side: StatementSide) -> Option<&StatementSection> {
        self.sections.iter().find(|s| s.side == side)
    }

    pub fn line(&self, code: &str) -> Option<&StatementLine> {
        self.sections.iter().find_map(|s| s.line(code))
    }
}

fn assigned_code(kind: StatementKind, row: &AccountBalance) -> Option<&str> {
    match kind {
        StatementKind::BalanceSheet => row.balance_sheet_code(),
        StatementKind::IncomeStatement => row.result_code(),
    }
}

/// Sum of closing balances routed to `code`. Exactly zero comes back as
/// `Ok(None)`.
pub fn line_amount(kind: StatementKind, balance: &TrialBalance, code: &str) -> Result<Option<Decimal>> {
    let amount = checked_sum(
        balance
            .rows
            .iter()
            .filter(|row| assigned_code(kind, row) == Some(code))
            .map(|row| row.amounts.closing_amount()),
    )
    .ok_or_else(|| StatementError::AmountOverflow {
        scope: format!("line {} of {} {}", code, kind, balance.year),
    })?;

    Ok(if amount.is_zero() { None } else { Some(amount) })
}

/// Fills one side's templates with amounts for years N and N-1. Lines are
/// independent: no line is derived from other lines.
pub fn assemble_side(
    kind: StatementKind,
    side: StatementSide,
    templates: &[LineTemplate],
    current: &TrialBalance,
    previous: &TrialBalance,
) -> Result<StatementSection> {
    let lines = templates
        .iter()
        .map(|template| {
            Ok(StatementLine {
                code: template.code,
                label: template.label,
                is_subtotal: template.is_subtotal(),
                current: line_amount(kind, current, template.code)?,
                previous: line_amount(kind, previous, template.code)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StatementSection { side, lines })
}

pub struct StatementAssembler<'a> {
    cache: &'a BalanceCache,
}

impl<'a> StatementAssembler<'a> {
    pub fn new(cache: &'a BalanceCache) -> Self {
        Self { cache }
    }

    /// Builds `kind` for the two requested years from cached trial balances.
    /// Fails with the recoverable `BalanceNotComputed` when either year has
    /// no balance cached under the requested selection and year source.
    pub fn assemble(
        &self,
        kind: StatementKind,
        request: &ComparativeRequest,
    ) -> Result<ComparativeStatement> {
        let current = self.cached(request, request.current_year)?;
        let previous = self.cached(request, request.previous_year)?;

        debug!(
            "Assembling {} for {} / {}",
            kind, request.current_year, request.previous_year
        );

        let sections = kind
            .sides()
            .into_iter()
            .map(|side| assemble_side(kind, side, side.templates(), current, previous))
            .collect::<Result<Vec<_>>>()?;

        Ok(ComparativeStatement {
            kind,
            current_year: request.current_year,
            previous_year: request.previous_year,
            sections,
        })
    }

    fn cached(&self, request: &ComparativeRequest, year: i32) -> Result<&'a TrialBalance> {
        self.cache.get(&request.snapshot_key(year)).ok_or_else(|| {
            warn!("Trial balance not available for fiscal year {}", year);
            StatementError::BalanceNotComputed { year }
        })
    }
}
