use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Required sheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("Sheet '{sheet}' is missing required column(s): {}", columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },

    #[error("Account code '{code}' appears more than once in the chart of accounts (rows {first_row} and {second_row})")]
    DuplicateAccount {
        code: String,
        first_row: usize,
        second_row: usize,
    },

    #[error("Ledger has no usable year column '{0}'")]
    MissingYearColumn(String),

    #[error("Amount overflow while summing {scope}")]
    AmountOverflow { scope: String },

    #[error("No chart of accounts or general ledger has been imported yet")]
    NoDataLoaded,

    #[error("The imported ledger has no entry with a readable date")]
    NoFiscalYears,

    #[error("No trial balance has been computed for fiscal year {year} with the current selection")]
    BalanceNotComputed { year: i32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Broad classification used by callers to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required sheet or column is absent; the operation produced nothing.
    InputFormat,
    /// The loaded data cannot support the request (e.g. no year column).
    Data,
    /// An upstream step has not run yet in this session.
    State,
    Config,
    Io,
}

impl StatementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSheet(_) | Self::MissingColumns { .. } | Self::DuplicateAccount { .. } => {
                ErrorKind::InputFormat
            }
            Self::MissingYearColumn(_) | Self::AmountOverflow { .. } => ErrorKind::Data,
            Self::NoDataLoaded | Self::NoFiscalYears | Self::BalanceNotComputed { .. } => {
                ErrorKind::State
            }
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Csv(_) | Self::SerializationError(_) | Self::IoError(_) => ErrorKind::Io,
        }
    }

    /// State errors leave the session usable: the caller can import data or
    /// compute the missing balance and retry the same request.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::State
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;
