//! The closed set of operations a session answers, one handler per variant.

use crate::chart_of_accounts::ChartOfAccounts;
use crate::engine::{BalanceRequest, TrialBalance};
use crate::error::Result;
use crate::ingestion::Workbook;
use crate::ledger_view::{LedgerFilter, LedgerView};
use crate::session::{ImportSummary, Session};
use crate::statements::{ComparativeRequest, ComparativeStatement};
use crate::templates::StatementKind;
use log::debug;
use std::fmt;

#[derive(Debug, Clone)]
pub enum Operation {
    Import(Workbook),
    ChartOfAccounts,
    GeneralLedger(LedgerFilter),
    TrialBalance(BalanceRequest),
    BalanceSheet(ComparativeRequest),
    IncomeStatement(ComparativeRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Import,
    ChartOfAccounts,
    GeneralLedger,
    TrialBalance,
    BalanceSheet,
    IncomeStatement,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        Self::Import,
        Self::ChartOfAccounts,
        Self::GeneralLedger,
        Self::TrialBalance,
        Self::BalanceSheet,
        Self::IncomeStatement,
    ];

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Import => "Import Fichier",
            Self::ChartOfAccounts => "Plan de comptes",
            Self::GeneralLedger => "Grand Livre",
            Self::TrialBalance => "Balance",
            Self::BalanceSheet => "Bilan",
            Self::IncomeStatement => "Compte de résultat",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label.trim())
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Import(_) => OperationKind::Import,
            Self::ChartOfAccounts => OperationKind::ChartOfAccounts,
            Self::GeneralLedger(_) => OperationKind::GeneralLedger,
            Self::TrialBalance(_) => OperationKind::TrialBalance,
            Self::BalanceSheet(_) => OperationKind::BalanceSheet,
            Self::IncomeStatement(_) => OperationKind::IncomeStatement,
        }
    }
}

#[derive(Debug, Clone)]
pub enum OperationOutput {
    Imported(ImportSummary),
    ChartOfAccounts(ChartOfAccounts),
    Ledger(LedgerView),
    TrialBalance(TrialBalance),
    Statement(ComparativeStatement),
}

impl Session {
    /// Runs one operation. Recoverable failures (nothing imported yet, a
    /// balance not computed) are warned about where they are raised.
    pub fn execute(&mut self, operation: Operation) -> Result<OperationOutput> {
        let kind = operation.kind();
        debug!("Executing operation '{}'", kind);

        let result = match operation {
            Operation::Import(workbook) => handle_import(self, &workbook),
            Operation::ChartOfAccounts => handle_chart_of_accounts(self),
            Operation::GeneralLedger(filter) => handle_general_ledger(self, &filter),
            Operation::TrialBalance(request) => handle_trial_balance(self, &request),
            Operation::BalanceSheet(request) => {
                handle_statement(self, StatementKind::BalanceSheet, &request)
            }
            Operation::IncomeStatement(request) => {
                handle_statement(self, StatementKind::IncomeStatement, &request)
            }
        };

        if let Err(e) = &result {
            debug!("Operation '{}' failed: {}", kind, e);
        }
        result
    }
}

fn handle_import(session: &mut Session, workbook: &Workbook) -> Result<OperationOutput> {
    session.import(workbook).map(OperationOutput::Imported)
}

fn handle_chart_of_accounts(session: &Session) -> Result<OperationOutput> {
    Ok(OperationOutput::ChartOfAccounts(session.chart()?.clone()))
}

fn handle_general_ledger(session: &Session, filter: &LedgerFilter) -> Result<OperationOutput> {
    session.ledger_view(filter).map(OperationOutput::Ledger)
}

fn handle_trial_balance(session: &mut Session, request: &BalanceRequest) -> Result<OperationOutput> {
    session.trial_balance(request).map(OperationOutput::TrialBalance)
}

fn handle_statement(
    session: &Session,
    kind: StatementKind,
    request: &ComparativeRequest,
) -> Result<OperationOutput> {
    session.statement(kind, request).map(OperationOutput::Statement)
}
