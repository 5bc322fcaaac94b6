use crate::error::{Result, StatementError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_CHART_SHEET: &str = "Plan de comptes";
pub const DEFAULT_LEDGER_SHEET: &str = "Grand Livre";
pub const DEFAULT_OPENING_FLAG: &str = "OUI";

/// The statement an account reports into, read from the "Tableau" column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatementGroup {
    /// Balance sheet ("Bilan").
    Bilan,
    /// Income statement ("Résultat").
    Resultat,
    /// Anything else, kept verbatim. Such accounts never receive a line code.
    Other(String),
}

impl StatementGroup {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Bilan" => Self::Bilan,
            "Résultat" => Self::Resultat,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Bilan => "Bilan",
            Self::Resultat => "Résultat",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Other(raw) if raw.is_empty())
    }
}

impl From<String> for StatementGroup {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<StatementGroup> for String {
    fn from(group: StatementGroup) -> Self {
        group.as_str().to_string()
    }
}

impl fmt::Display for StatementGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which accounts take part in a trial balance.
///
/// `None` selects everything; `Some(set)` keeps only the listed statement
/// groups or first-digit account classes, so `Some(empty)` selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountSelection {
    #[serde(default)]
    pub groups: Option<BTreeSet<String>>,
    #[serde(default)]
    pub classes: Option<BTreeSet<char>>,
}

impl AccountSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_classes<I: IntoIterator<Item = char>>(mut self, classes: I) -> Self {
        self.classes = Some(classes.into_iter().collect());
        self
    }

    pub fn includes_group(&self, group: &StatementGroup) -> bool {
        match &self.groups {
            None => true,
            Some(groups) => groups.contains(group.as_str()),
        }
    }

    pub fn includes_class(&self, class: Option<char>) -> bool {
        match (&self.classes, class) {
            (None, _) => true,
            (Some(classes), Some(class)) => classes.contains(&class),
            (Some(_), None) => false,
        }
    }
}

/// Source of the fiscal year used to pick ledger rows for a trial balance.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "PascalCase", tag = "source", content = "column")]
pub enum YearColumn {
    #[default]
    #[schemars(description = "Calendar year of the parsed posting date (the derived 'Année' field).")]
    Derived,

    #[schemars(
        description = "A ledger column carried verbatim from the input whose cells hold the fiscal year as an integer."
    )]
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProcessingConfig {
    #[schemars(description = "Name of the table holding the chart of accounts.")]
    pub chart_sheet: String,

    #[schemars(description = "Name of the table holding the general ledger entries.")]
    pub ledger_sheet: String,

    #[schemars(
        description = "Value of the AN column marking an opening-balance entry. Compared case-insensitively."
    )]
    pub opening_flag: String,

    #[schemars(
        description = "chrono format strings tried in order when parsing the Date column. Day-first formats come first."
    )]
    pub date_formats: Vec<String>,

    #[schemars(
        description = "Accept spreadsheet serial day numbers (days since 1899-12-30) in the Date column."
    )]
    pub spreadsheet_serial_dates: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chart_sheet: DEFAULT_CHART_SHEET.to_string(),
            ledger_sheet: DEFAULT_LEDGER_SHEET.to_string(),
            opening_flag: DEFAULT_OPENING_FLAG.to_string(),
            date_formats: [
                "%d/%m/%Y",
                "%Y-%m-%d",
                "%Y-%m-%d %H:%M:%S",
                "%d-%m-%Y",
                "%d.%m.%Y",
                "%Y/%m/%d",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
            spreadsheet_serial_dates: true,
        }
    }
}

impl ProcessingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.opening_flag.trim().is_empty() {
            return Err(StatementError::InvalidConfig(
                "opening_flag must not be empty".to_string(),
            ));
        }
        if self.date_formats.is_empty() && !self.spreadsheet_serial_dates {
            return Err(StatementError::InvalidConfig(
                "at least one date format or spreadsheet serial dates must be enabled".to_string(),
            ));
        }
        if self.chart_sheet.trim() == self.ledger_sheet.trim() {
            return Err(StatementError::InvalidConfig(format!(
                "chart and ledger sheets must differ (both '{}')",
                self.chart_sheet
            )));
        }
        Ok(())
    }

    pub fn is_opening_flag(&self, an: &str) -> bool {
        an.trim().to_uppercase() == self.opening_flag.trim().to_uppercase()
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(ProcessingConfig);
        serde_json::to_string_pretty(&schema)
    }
}
