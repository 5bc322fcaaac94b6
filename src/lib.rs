//! # SYSCOHADA Statements
//!
//! Computes the trial balance, balance sheet and income statement of an
//! entity keeping SYSCOHADA accounts, from two tables: the chart of accounts
//! ("Plan de comptes") and the general ledger ("Grand Livre").
//!
//! ## Core Concepts
//!
//! - **Chart of accounts**: every account with its statement group ("Bilan",
//!   "Résultat") and the four mapping codes (BD, BC, RD, RC) that route its
//!   closing balance to a statement line
//! - **Trial balance**: opening (SI), movement (Mouv) and closing (SF)
//!   debit/credit per account for one fiscal year and account selection
//! - **Statements**: fixed SYSCOHADA layouts whose lines sum the closing
//!   balances routed to their code, for year N and year N-1
//! - **Session**: owns the imported data and the cache of computed trial
//!   balances that statements are assembled from
//!
//! ## Example
//!
//! ```rust,ignore
//! use syscohada_statements::*;
//!
//! let config = ProcessingConfig::default();
//! let workbook = Workbook::from_csv_files(&config, "plan.csv", "grand_livre.csv")?;
//!
//! let mut session = Session::new(config)?;
//! session.import(&workbook)?;
//!
//! let statements = process_statements(&mut session, &ComparativeRequest::new(2024, 2023))?;
//! println!("{}", statement_to_markdown(&statements.balance_sheet));
//! ```

pub mod cache;
pub mod chart_of_accounts;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod ledger;
pub mod ledger_view;
pub mod operations;
pub mod schema;
pub mod session;
pub mod statements;
pub mod templates;
pub mod utils;

pub use cache::{BalanceCache, SnapshotKey};
pub use chart_of_accounts::{Account, ChartOfAccounts, MappingCodes};
pub use engine::{
    assign_code, compute_trial_balance, AccountBalance, AssignedCode, BalanceAmounts, BalanceEngine,
    BalanceRequest, TrialBalance,
};
pub use error::{ErrorKind, Result, StatementError};
pub use export::*;
pub use ingestion::*;
pub use ledger::{normalize_ledger, CoercionWarning, GeneralLedger, LedgerEntry, ParsedCell};
pub use ledger_view::{BalanceObservation, LedgerFilter, LedgerFilterOptions, LedgerView};
pub use operations::{Operation, OperationKind, OperationOutput};
pub use schema::*;
pub use session::{ImportSummary, Session};
pub use statements::{
    ComparativeRequest, ComparativeStatement, StatementAssembler, StatementLine, StatementSection,
};
pub use templates::{LineTemplate, StatementKind, StatementSide};
pub use utils::*;

use log::{debug, info, warn};
use serde::Serialize;

/// Both statements for one pair of fiscal years.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialStatements {
    pub balance_sheet: ComparativeStatement,
    pub income_statement: ComparativeStatement,
}

pub struct StatementsProcessor;

impl StatementsProcessor {
    /// Computes (or recomputes) the trial balances of both requested years
    /// under the request's selection, then assembles both statements.
    pub fn process(session: &mut Session, request: &ComparativeRequest) -> Result<FinancialStatements> {
        info!(
            "Producing financial statements for {} with comparative year {}",
            request.current_year, request.previous_year
        );

        let mut years = vec![request.current_year];
        if request.previous_year != request.current_year {
            years.push(request.previous_year);
        }
        for year in years {
            let balance = session.trial_balance(
                &BalanceRequest::new(year)
                    .with_selection(request.selection.clone())
                    .with_year_column(request.year_column.clone()),
            )?;
            debug!(
                "Trial balance {}: {} accounts, imbalance {}",
                year,
                balance.rows.len(),
                balance.imbalance()
            );
        }

        Ok(FinancialStatements {
            balance_sheet: session.balance_sheet(request)?,
            income_statement: session.income_statement(request)?,
        })
    }

    /// Same as [`StatementsProcessor::process`] for the two latest fiscal
    /// years found in the ledger.
    pub fn process_latest(session: &mut Session) -> Result<FinancialStatements> {
        let years = session.available_years()?;
        let request = ComparativeRequest::latest(&years).ok_or_else(|| {
            warn!("No fiscal year can be read from the ledger dates");
            StatementError::NoFiscalYears
        })?;
        Self::process(session, &request)
    }
}

pub fn process_statements(session: &mut Session, request: &ComparativeRequest) -> Result<FinancialStatements> {
    StatementsProcessor::process(session, request)
}
