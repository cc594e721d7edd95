use async_trait::async_trait;

use super::{ExternalRecord, ImportError, ImportSource};

/// Import source answering from memory. Useful offline and in tests.
#[derive(Debug, Clone)]
pub struct StaticImportSource {
    response: Result<Vec<ExternalRecord>, ImportError>,
}

impl StaticImportSource {
    pub fn new(records: Vec<ExternalRecord>) -> Self {
        Self {
            response: Ok(records),
        }
    }

    pub fn failing(error: ImportError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[async_trait]
impl ImportSource for StaticImportSource {
    async fn fetch_records(&self) -> Result<Vec<ExternalRecord>, ImportError> {
        self.response.clone()
    }
}
