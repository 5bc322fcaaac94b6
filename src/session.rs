use crate::cache::{BalanceCache, SnapshotKey};
use crate::chart_of_accounts::ChartOfAccounts;
use crate::engine::{BalanceEngine, BalanceRequest, TrialBalance};
use crate::error::{Result, StatementError};
use crate::ingestion::Workbook;
use crate::ledger::{normalize_ledger, CoercionWarning, GeneralLedger};
use crate::ledger_view::{LedgerFilter, LedgerFilterOptions, LedgerView};
use crate::schema::ProcessingConfig;
use crate::statements::{ComparativeRequest, ComparativeStatement, StatementAssembler};
use crate::templates::StatementKind;
use log::{debug, info, warn};
use serde::Serialize;

/// Chart and ledger are only ever replaced together.
#[derive(Debug, Clone)]
struct LoadedData {
    chart: ChartOfAccounts,
    ledger: GeneralLedger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub accounts: usize,
    pub entries: usize,
    pub fiscal_years: Vec<i32>,
    pub warnings: Vec<CoercionWarning>,
}

/// One user's working state: the imported tables and the trial balances
/// computed from them.
#[derive(Debug, Clone)]
pub struct Session {
    config: ProcessingConfig,
    data: Option<LoadedData>,
    cache: BalanceCache,
}

impl Session {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            data: None,
            cache: BalanceCache::new(),
        })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Parses both sheets of `workbook`. Nothing changes unless both parse;
    /// on success the previous data and every cached balance are discarded.
    pub fn import(&mut self, workbook: &Workbook) -> Result<ImportSummary> {
        let chart = ChartOfAccounts::from_table(workbook.table(&self.config.chart_sheet)?)?;
        let ledger = normalize_ledger(workbook.table(&self.config.ledger_sheet)?, &self.config)?;

        let summary = ImportSummary {
            accounts: chart.len(),
            entries: ledger.len(),
            fiscal_years: ledger.fiscal_years(),
            warnings: ledger.warnings.clone(),
        };
        info!(
            "Imported {} accounts and {} ledger entries (fiscal years {:?})",
            summary.accounts, summary.entries, summary.fiscal_years
        );

        if !self.cache.is_empty() {
            debug!("Discarding {} cached trial balances", self.cache.len());
        }
        self.cache.clear();
        self.data = Some(LoadedData { chart, ledger });

        Ok(summary)
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    fn data(&self) -> Result<&LoadedData> {
        self.data.as_ref().ok_or_else(|| {
            warn!("No chart of accounts and ledger imported yet");
            StatementError::NoDataLoaded
        })
    }

    pub fn chart(&self) -> Result<&ChartOfAccounts> {
        Ok(&self.data()?.chart)
    }

    pub fn ledger(&self) -> Result<&GeneralLedger> {
        Ok(&self.data()?.ledger)
    }

    pub fn available_years(&self) -> Result<Vec<i32>> {
        Ok(self.ledger()?.fiscal_years())
    }

    pub fn ledger_filter_options(&self) -> Result<LedgerFilterOptions> {
        Ok(LedgerFilterOptions::from_ledger(self.ledger()?))
    }

    pub fn ledger_view(&self, filter: &LedgerFilter) -> Result<LedgerView> {
        LedgerView::build(self.ledger()?, filter)
    }

    /// Computes the trial balance and commits it to the cache, replacing any
    /// earlier result for the same year, selection and year source.
    pub fn trial_balance(&mut self, request: &BalanceRequest) -> Result<TrialBalance> {
        let data = self.data()?;
        let balance = BalanceEngine::new(&self.config).compute(&data.ledger, &data.chart, request)?;
        self.cache.put(balance.clone());
        Ok(balance)
    }

    pub fn cached_balance(&self, request: &BalanceRequest) -> Option<&TrialBalance> {
        self.cache.get(&SnapshotKey::for_request(request))
    }

    pub fn statement(&self, kind: StatementKind, request: &ComparativeRequest) -> Result<ComparativeStatement> {
        StatementAssembler::new(&self.cache).assemble(kind, request)
    }

    pub fn balance_sheet(&self, request: &ComparativeRequest) -> Result<ComparativeStatement> {
        self.statement(StatementKind::BalanceSheet, request)
    }

    pub fn income_statement(&self, request: &ComparativeRequest) -> Result<ComparativeStatement> {
        self.statement(StatementKind::IncomeStatement, request)
    }

    pub fn cache(&self) -> &BalanceCache {
        &self.cache
    }
}
