//! Domain models for dte-service.

mod account;
mod document;
mod entry;
mod summary;
mod supplier;

pub use account::{Account, AccountKind, CreateAccount, MandatoryAccounts};
pub use account::{FALLBACK_EXPENSE_ACCOUNT, PAYABLES_ACCOUNT, TAX_CREDIT_ACCOUNT};
pub use document::{Document, DocumentRecord};
pub use entry::{LedgerEntry, Movement, PostingResult};
pub use summary::{AccountTotal, StoreCounts};
pub use supplier::Supplier;
