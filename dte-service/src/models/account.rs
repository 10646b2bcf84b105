//! Chart-of-accounts model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Fallback expense account assigned to unclassified suppliers.
pub const FALLBACK_EXPENSE_ACCOUNT: &str = "Gastos Generales (Por Clasificar)";
/// Account debited with the recoverable tax portion of a purchase.
pub const TAX_CREDIT_ACCOUNT: &str = "IVA Crédito Fiscal";
/// Account credited with the payable total of a purchase.
pub const PAYABLES_ACCOUNT: &str = "Proveedores por Pagar";

/// Account kinds following standard accounting categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the chart of accounts. Immutable reference data.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    pub code: String,
    pub name: String,
    pub kind: String,
}

impl Account {
    /// Get parsed account kind.
    pub fn parsed_kind(&self) -> Option<AccountKind> {
        AccountKind::parse(&self.kind)
    }
}

/// Input for creating a chart-of-accounts row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
}

/// The accounts every purchase posting references, resolved by their
/// business-rule names. Missing any of them is a configuration error,
/// never a per-document failure.
#[derive(Debug, Clone)]
pub struct MandatoryAccounts {
    pub expense_fallback: Account,
    pub tax_credit: Account,
    pub payables: Account,
}
