use thiserror::Error;

use crate::import::ImportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Session closed before the import finished")]
    SessionClosed,

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Import task failed: {0}")]
    ImportTask(#[from] tokio::task::JoinError),
}
