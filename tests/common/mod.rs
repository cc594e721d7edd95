// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tally::application::BudgetSession;
use tally::config::ImportConfig;
use tally::import::{ExternalRecord, ImportError, ImportSource, StaticImportSource};
use tokio::sync::Notify;

/// External records shaped like a bank feed: `{"id": n, "amount": a}`.
pub fn bank_records(amounts: &[f64]) -> Vec<ExternalRecord> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| ExternalRecord::from(json!({"id": i + 1, "amount": amount})))
        .collect()
}

/// Helper to create a session backed by an in-memory source
pub fn test_session(records: Vec<ExternalRecord>) -> BudgetSession {
    BudgetSession::new(
        Arc::new(StaticImportSource::new(records)),
        ImportConfig::default(),
    )
}

/// Helper to create a session whose imports always fail
pub fn failing_session(error: ImportError) -> BudgetSession {
    BudgetSession::new(
        Arc::new(StaticImportSource::failing(error)),
        ImportConfig::default(),
    )
}

/// Import source that holds its answer until released.
pub struct GatedSource {
    gate: Arc<Notify>,
    records: Vec<ExternalRecord>,
}

impl GatedSource {
    pub fn new(records: Vec<ExternalRecord>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                gate: Arc::clone(&gate),
                records,
            },
            gate,
        )
    }
}

#[async_trait]
impl ImportSource for GatedSource {
    async fn fetch_records(&self) -> Result<Vec<ExternalRecord>, ImportError> {
        self.gate.notified().await;
        Ok(self.records.clone())
    }
}

/// Small deterministic generator so property checks are reproducible.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}
