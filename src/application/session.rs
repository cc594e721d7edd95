use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::domain::{Cents, ExpenseId, ExpenseRecord, Ledger, LedgerSnapshot};
use crate::import::{ImportSource, map_records};

use super::AppError;

/// Result of one completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records returned by the source before the limit was applied
    pub fetched: usize,
    /// Ids of the expenses appended to the ledger, in order
    pub imported: Vec<ExpenseId>,
    /// Records within the limit that could not be mapped
    pub skipped: usize,
}

/// An import running in the background. The ledger is only touched once the
/// fetch succeeds, and only if the session is still alive at that point.
pub struct PendingImport {
    handle: JoinHandle<Result<ImportSummary, AppError>>,
}

impl PendingImport {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> Result<ImportSummary, AppError> {
        self.handle.await?
    }
}

/// Owns the ledger of one budgeting session.
///
/// The ledger lives as long as the session. Dropping the session discards
/// the ledger, and any import still in flight is thrown away when it resolves.
pub struct BudgetSession {
    ledger: Arc<Mutex<Ledger>>,
    source: Arc<dyn ImportSource>,
    config: ImportConfig,
}

impl BudgetSession {
    pub fn new(source: Arc<dyn ImportSource>, config: ImportConfig) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger::new())),
            source,
            config,
        }
    }

    // ========================
    // Ledger operations
    // ========================

    pub async fn set_income(&self, income: Cents) {
        self.ledger.lock().await.set_income(income);
    }

    pub async fn set_income_text(&self, text: &str) {
        self.ledger.lock().await.set_income_text(text);
    }

    pub async fn add_expense(&self, description: &str, amount: &str) -> Option<ExpenseId> {
        self.ledger.lock().await.add_expense(description, amount)
    }

    pub async fn remove_expense(&self, id: ExpenseId) -> bool {
        self.ledger.lock().await.remove_expense(id)
    }

    /// Remove the expense whose id starts with `prefix`.
    pub async fn remove_by_prefix(&self, prefix: &str) -> Result<ExpenseRecord, AppError> {
        let mut ledger = self.ledger.lock().await;
        let record = ledger
            .find_by_prefix(prefix)
            .cloned()
            .ok_or_else(|| AppError::ExpenseNotFound(prefix.to_string()))?;
        ledger.remove_expense(record.id);
        Ok(record)
    }

    pub async fn balance(&self) -> Cents {
        self.ledger.lock().await.balance()
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.lock().await.snapshot()
    }

    // ========================
    // Imports
    // ========================

    /// Fetch from the import source and apply the result before returning.
    pub async fn import_now(&self) -> Result<ImportSummary, AppError> {
        run_import(
            Arc::downgrade(&self.ledger),
            Arc::clone(&self.source),
            self.config.clone(),
        )
        .await
    }

    /// Start an import on the runtime and return immediately. Other ledger
    /// operations may run while the fetch is outstanding.
    ///
    /// Must be called from within a tokio runtime; it panics otherwise.
    pub fn start_import(&self) -> PendingImport {
        let handle = tokio::spawn(run_import(
            Arc::downgrade(&self.ledger),
            Arc::clone(&self.source),
            self.config.clone(),
        ));
        PendingImport { handle }
    }

    /// End the session. Imports still in flight will find the ledger gone.
    pub fn close(self) {
        info!("budget session closed");
    }
}

async fn run_import(
    ledger: Weak<Mutex<Ledger>>,
    source: Arc<dyn ImportSource>,
    config: ImportConfig,
) -> Result<ImportSummary, AppError> {
    let records = source.fetch_records().await.map_err(|e| {
        warn!(error = %e, "import failed, ledger left unchanged");
        AppError::from(e)
    })?;

    let batch = map_records(&records, &config);

    let Some(ledger) = ledger.upgrade() else {
        warn!(
            fetched = records.len(),
            "session closed before import finished, discarding result"
        );
        return Err(AppError::SessionClosed);
    };

    let imported = ledger.lock().await.import_expenses(batch.expenses);
    info!(
        fetched = records.len(),
        imported = imported.len(),
        skipped = batch.skipped,
        "import applied"
    );

    Ok(ImportSummary {
        fetched: records.len(),
        imported,
        skipped: batch.skipped,
    })
}
