//! Fetching expense-like records from outside the ledger and mapping them
//! into [`ImportedExpense`] values.

mod fixture;
mod http;

pub use fixture::*;
pub use http::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::ImportConfig;
use crate::domain::{Cents, ImportedExpense, cents_from_f64, parse_cents};

#[derive(Debug, Clone, Error)]
pub enum ImportError {
    #[error("No import endpoint configured")]
    NoEndpoint,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Import source returned status {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for ImportError {
    fn from(e: reqwest::Error) -> Self {
        ImportError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> Self {
        ImportError::Payload(e.to_string())
    }
}

/// Anything able to hand over a finite batch of external records.
#[async_trait]
pub trait ImportSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<ExternalRecord>, ImportError>;
}

/// One record as delivered by an import source: an arbitrary JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRecord(pub Map<String, Value>);

impl ExternalRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The identifying field rendered as text. Strings and numbers qualify.
    pub fn identifier(&self, field: &str) -> Option<String> {
        match self.field(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The amount field in cents, if present and numeric.
    pub fn amount(&self, field: &str) -> Option<Cents> {
        match self.field(field)? {
            Value::Number(n) => n.as_f64().and_then(|f| cents_from_f64(f).ok()),
            Value::String(s) => parse_cents(s).ok(),
            _ => None,
        }
    }
}

impl From<Value> for ExternalRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ExternalRecord(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                ExternalRecord(map)
            }
        }
    }
}

/// Decode a JSON array of objects.
pub fn parse_payload(body: &str) -> Result<Vec<ExternalRecord>, ImportError> {
    Ok(serde_json::from_str(body)?)
}

/// Outcome of mapping one fetched batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedBatch {
    pub expenses: Vec<ImportedExpense>,
    /// Records within the limit that lacked a usable identifier or amount
    pub skipped: usize,
}

/// Map at most `config.limit` records, in order. A record needs both the
/// identifier field and a positive amount field to become an expense.
pub fn map_records(records: &[ExternalRecord], config: &ImportConfig) -> MappedBatch {
    let mut batch = MappedBatch::default();

    for record in records.iter().take(config.limit) {
        let Some(external_id) = record.identifier(&config.id_field) else {
            debug!(field = %config.id_field, "record has no identifier, skipping");
            batch.skipped += 1;
            continue;
        };

        match record.amount(&config.amount_field) {
            Some(amount_cents) if amount_cents > 0 => {
                batch.expenses.push(ImportedExpense {
                    description: format!("{} {}", config.description_prefix, external_id),
                    external_id,
                    amount_cents,
                });
            }
            _ => {
                debug!(%external_id, field = %config.amount_field, "record has no usable amount, skipping");
                batch.skipped += 1;
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> ExternalRecord {
        ExternalRecord::from(value)
    }

    #[test]
    fn test_identifier_accepts_numbers_and_strings() {
        let r = record(json!({"id": 7, "ref": " tx-9 ", "blank": "", "flag": true}));
        assert_eq!(r.identifier("id"), Some("7".to_string()));
        assert_eq!(r.identifier("ref"), Some("tx-9".to_string()));
        assert_eq!(r.identifier("blank"), None);
        assert_eq!(r.identifier("flag"), None);
        assert_eq!(r.identifier("missing"), None);
    }

    #[test]
    fn test_amount_accepts_numbers_and_strings() {
        let r = record(json!({"a": 12.5, "b": "7.25", "c": "n/a", "d": null}));
        assert_eq!(r.amount("a"), Some(1250));
        assert_eq!(r.amount("b"), Some(725));
        assert_eq!(r.amount("c"), None);
        assert_eq!(r.amount("d"), None);
    }

    #[test]
    fn test_map_records_honours_limit_and_order() {
        let records: Vec<ExternalRecord> = (1..=5)
            .map(|i| record(json!({"id": i, "amount": i * 10})))
            .collect();

        let batch = map_records(&records, &ImportConfig::default());

        assert_eq!(batch.skipped, 0);
        let ids: Vec<&str> = batch.expenses.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(batch.expenses[0].description, "Transaction 1");
        assert_eq!(batch.expenses[2].amount_cents, 3000);
    }

    #[test]
    fn test_map_records_skips_records_without_amount() {
        let records = vec![
            record(json!({"id": 1, "title": "no amount here"})),
            record(json!({"id": 2, "amount": -4})),
            record(json!({"amount": 9})),
        ];

        let batch = map_records(&records, &ImportConfig::default());
        assert!(batch.expenses.is_empty());
        assert_eq!(batch.skipped, 3);
    }

    #[test]
    fn test_map_records_uses_configured_fields() {
        let config = ImportConfig {
            id_field: "reference".to_string(),
            amount_field: "value".to_string(),
            description_prefix: "Bank".to_string(),
            limit: 10,
            ..ImportConfig::default()
        };
        let records = vec![record(json!({"reference": "ABC", "value": "19.99"}))];

        let batch = map_records(&records, &config);
        assert_eq!(
            batch.expenses,
            vec![ImportedExpense {
                external_id: "ABC".to_string(),
                description: "Bank ABC".to_string(),
                amount_cents: 1999,
            }]
        );
    }

    #[test]
    fn test_parse_payload() {
        let records = parse_payload(r#"[{"id": 1, "amount": 3}, {"id": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);

        assert!(matches!(
            parse_payload(r#"{"id": 1}"#),
            Err(ImportError::Payload(_))
        ));
        assert!(matches!(parse_payload("[1, 2]"), Err(ImportError::Payload(_))));
    }
}
