use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type ExpenseId = Uuid;

/// Where an expense entered the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ExpenseOrigin {
    /// Typed in by the user
    Manual,
    /// Mapped from a record returned by an import source
    Imported { external_id: String },
}

/// A single expense entry. Records are only ever created by the ledger,
/// which guarantees a trimmed non-empty description and a positive amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    /// Insertion counter, strictly increasing within one ledger
    pub sequence: u64,
    pub description: String,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub origin: ExpenseOrigin,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    pub(crate) fn new(
        sequence: u64,
        description: String,
        amount_cents: Cents,
        origin: ExpenseOrigin,
    ) -> Self {
        debug_assert!(amount_cents > 0, "Expense amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence,
            description,
            amount_cents,
            origin,
            created_at: Utc::now(),
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self.origin, ExpenseOrigin::Imported { .. })
    }
}
