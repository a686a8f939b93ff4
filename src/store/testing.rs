//! Scripted reading store for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::StoreError;

use super::{ReadingRow, SensorReadingStore};

/// A store that replays queued results in order and records every
/// statement it receives.
pub struct ScriptedStore {
    script: Mutex<VecDeque<Result<Vec<ReadingRow>, StoreError>>>,
    calls: Mutex<Vec<RecordedSelect>>,
}

#[derive(Debug, Clone)]
pub struct RecordedSelect {
    pub sql: String,
    pub params: Vec<String>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_rows(&self, rows: Vec<ReadingRow>) {
        self.script.lock().push_back(Ok(rows));
    }

    pub fn push_error(&self, error: StoreError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedSelect> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorReadingStore for ScriptedStore {
    async fn execute_select(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<ReadingRow>, StoreError> {
        self.calls.lock().push(RecordedSelect {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.script.lock().pop_front().unwrap_or_else(|| {
            Err(StoreError::QueryFailed {
                reason: "No scripted rows queued".to_string(),
            })
        })
    }
}
