use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys that schemars emits but the Gemini `responseSchema` subset rejects.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["$schema", "definitions", "title", "additionalProperties"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRow {
    #[schemars(description = "Line item label exactly as printed in the report (e.g. 'Revenue from operations')")]
    pub label: String,

    #[schemars(
        description = "One value per year column, in the same order as the statement's years. Keep the figures as printed, including brackets for negatives."
    )]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "True when the row is a subtotal or total (e.g. 'Total Assets', 'Profit for the year')")]
    pub is_total: Option<bool>,
}

impl FinancialRow {
    pub fn new(label: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            label: label.into(),
            values,
            is_total: None,
        }
    }

    pub fn total(label: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            label: label.into(),
            values,
            is_total: Some(true),
        }
    }

    pub fn is_total(&self) -> bool {
        self.is_total.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStatement {
    #[schemars(description = "Statement heading as it appears in the report")]
    pub title: String,

    #[schemars(description = "Column labels for the reporting years (e.g. 'FY2024', '31 March 2023')")]
    pub years: Vec<String>,

    #[schemars(description = "Line items in the order they appear in the statement")]
    pub rows: Vec<FinancialRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    #[schemars(description = "Legal name of the reporting company")]
    pub company_name: String,

    #[schemars(description = "Period covered by the report (e.g. 'FY2024' or 'Year ended 31 March 2024')")]
    pub reporting_period: String,

    #[schemars(description = "Profit & Loss statement (Statement of Comprehensive Income)")]
    pub profit_and_loss: FinancialStatement,

    #[schemars(description = "Balance Sheet (Statement of Financial Position)")]
    pub balance_sheet: FinancialStatement,

    #[schemars(description = "Cash Flow statement")]
    pub cash_flow: FinancialStatement,
}

impl ExtractionResult {
    pub fn statement(&self, kind: StatementKind) -> &FinancialStatement {
        match kind {
            StatementKind::ProfitAndLoss => &self.profit_and_loss,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    /// The structured-output schema sent with every extraction request.
    ///
    /// Generated in the OpenAPI 3 flavour with every subschema inlined, then
    /// stripped of keys the provider does not accept.
    pub fn response_schema() -> serde_json::Value {
        let settings = SchemaSettings::openapi3().with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        });
        let root = settings.into_generator().into_root_schema_for::<ExtractionResult>();
        let mut value = serde_json::to_value(root).unwrap_or(serde_json::Value::Null);
        strip_unsupported_keys(&mut value);
        value
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::response_schema())
    }
}

fn strip_unsupported_keys(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for key in UNSUPPORTED_SCHEMA_KEYS {
                map.remove(*key);
            }
            // `properties` keys are field names, not schema keywords
            for (key, child) in map.iter_mut() {
                if key == "properties" {
                    if let serde_json::Value::Object(props) = child {
                        props.values_mut().for_each(strip_unsupported_keys);
                    }
                } else {
                    strip_unsupported_keys(child);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_unsupported_keys),
        _ => {}
    }
}

/// Whether the figures cover the parent company alone or the whole group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ReportingBasis {
    #[default]
    Consolidated,
    Standalone,
}

impl ReportingBasis {
    pub const ALL: [ReportingBasis; 2] = [ReportingBasis::Consolidated, ReportingBasis::Standalone];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consolidated => "Consolidated",
            Self::Standalone => "Standalone",
        }
    }
}

impl fmt::Display for ReportingBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportingBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consolidated" => Ok(Self::Consolidated),
            "standalone" => Ok(Self::Standalone),
            other => Err(format!(
                "unknown reporting basis '{}': expected 'consolidated' or 'standalone'",
                other
            )),
        }
    }
}

/// The statement tabs of a result view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    #[default]
    ProfitAndLoss,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::ProfitAndLoss,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];

    /// Field name of the statement in the wire format.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ProfitAndLoss => "profitAndLoss",
            Self::BalanceSheet => "balanceSheet",
            Self::CashFlow => "cashFlow",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ProfitAndLoss => "Profit & Loss",
            Self::BalanceSheet => "Balance Sheet",
            Self::CashFlow => "Cash Flow",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pl" | "p&l" | "pnl" | "profitandloss" | "profit-and-loss" => Ok(Self::ProfitAndLoss),
            "bs" | "balancesheet" | "balance-sheet" => Ok(Self::BalanceSheet),
            "cf" | "cashflow" | "cash-flow" => Ok(Self::CashFlow),
            other => Err(format!(
                "unknown statement '{}': expected 'pl', 'bs' or 'cf'",
                other
            )),
        }
    }
}
