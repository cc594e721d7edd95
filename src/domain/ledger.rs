use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::{Cents, ExpenseId, ExpenseOrigin, ExpenseRecord, ParseCentsError, parse_cents};

/// Why a candidate expense was not added. Rejections never surface to the
/// caller of [`Ledger::add_expense`]; they are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpenseRejection {
    #[error("description is empty")]
    EmptyDescription,

    #[error("amount is not a number: {0}")]
    InvalidAmount(#[from] ParseCentsError),

    #[error("amount must be positive, got {0} cents")]
    NonPositiveAmount(Cents),

    #[error("total expenses would exceed the representable range")]
    TotalOverflow,
}

/// An expense already mapped from an external record, waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedExpense {
    pub external_id: String,
    pub description: String,
    pub amount_cents: Cents,
}

/// Read-only view handed to whatever renders the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub income: Cents,
    pub total_expenses: Cents,
    pub balance: Cents,
    pub expenses: Vec<ExpenseRecord>,
}

/// In-memory budget ledger: an income figure and an ordered list of expenses.
/// The balance is always derived, never stored.
#[derive(Debug, Default)]
pub struct Ledger {
    income: Cents,
    expenses: Vec<ExpenseRecord>,
    next_sequence: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn income(&self) -> Cents {
        self.income
    }

    /// Replace the income. Negative values are clamped to zero.
    pub fn set_income(&mut self, income: Cents) {
        self.income = income.max(0);
    }

    /// Replace the income from user text. Unparseable text resets income to zero.
    pub fn set_income_text(&mut self, text: &str) {
        let income = parse_cents(text).unwrap_or_else(|e| {
            debug!(input = text, error = %e, "income input not a number, using zero");
            0
        });
        self.set_income(income);
    }

    /// Add an expense typed by the user. Invalid input is ignored and `None`
    /// is returned; nothing about the ledger changes in that case.
    pub fn add_expense(&mut self, description: &str, amount: &str) -> Option<ExpenseId> {
        let parsed = parse_cents(amount).map_err(ExpenseRejection::from);
        self.try_add(description, parsed, ExpenseOrigin::Manual)
    }

    /// Same as [`Ledger::add_expense`] for an amount that is already numeric.
    pub fn add_expense_cents(&mut self, description: &str, amount: Cents) -> Option<ExpenseId> {
        self.try_add(description, Ok(amount), ExpenseOrigin::Manual)
    }

    /// Remove an expense by id. Returns `false` if no such expense exists.
    pub fn remove_expense(&mut self, id: ExpenseId) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        let removed = self.expenses.len() != before;
        if removed {
            debug!(%id, "expense removed");
        }
        removed
    }

    /// Append mapped external expenses after every existing record, keeping
    /// their relative order. Entries that would break the record invariants
    /// are skipped. Returns the ids of the appended records.
    pub fn import_expenses<I>(&mut self, items: I) -> Vec<ExpenseId>
    where
        I: IntoIterator<Item = ImportedExpense>,
    {
        items
            .into_iter()
            .filter_map(|item| {
                let origin = ExpenseOrigin::Imported {
                    external_id: item.external_id,
                };
                self.try_add(&item.description, Ok(item.amount_cents), origin)
            })
            .collect()
    }

    /// income - sum of all expense amounts
    pub fn balance(&self) -> Cents {
        self.income - self.total_expenses()
    }

    pub fn total_expenses(&self) -> Cents {
        self.expenses.iter().map(|e| e.amount_cents).sum()
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn get(&self, id: ExpenseId) -> Option<&ExpenseRecord> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Find the single expense whose id starts with `prefix`.
    /// Ambiguous or unknown prefixes yield `None`.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&ExpenseRecord> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self
            .expenses
            .iter()
            .filter(|e| e.id.to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Some(found),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            income: self.income,
            total_expenses: self.total_expenses(),
            balance: self.balance(),
            expenses: self.expenses.clone(),
        }
    }

    fn try_add(
        &mut self,
        description: &str,
        amount: Result<Cents, ExpenseRejection>,
        origin: ExpenseOrigin,
    ) -> Option<ExpenseId> {
        let validated = validate_expense(description, amount).and_then(|(description, amount)| {
            // Keeps total_expenses() and balance() free of overflow
            self.total_expenses()
                .checked_add(amount)
                .map(|_| (description, amount))
                .ok_or(ExpenseRejection::TotalOverflow)
        });

        match validated {
            Ok((description, amount_cents)) => {
                let record = ExpenseRecord::new(self.next_sequence, description, amount_cents, origin);
                self.next_sequence += 1;
                let id = record.id;
                debug!(%id, amount_cents, "expense added");
                self.expenses.push(record);
                Some(id)
            }
            Err(rejection) => {
                debug!(description, reason = %rejection, "expense rejected");
                None
            }
        }
    }
}

/// Validation order: description first, then amount format, then sign.
pub fn validate_expense(
    description: &str,
    amount: Result<Cents, ExpenseRejection>,
) -> Result<(String, Cents), ExpenseRejection> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ExpenseRejection::EmptyDescription);
    }
    let amount = amount?;
    if amount <= 0 {
        return Err(ExpenseRejection::NonPositiveAmount(amount));
    }
    Ok((description.to_string(), amount))
}
