//! Availability-aware facade over the inspection log.
//!
//! Opening the database happens once per process. If it fails the store
//! stays disabled until restart and every operation reports
//! [`StoreError::Unavailable`] instead of touching disk.

use std::{fmt, path::PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{log_error, log_info};

use super::{Database, InspectionRecord, NewInspection};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Append,
    List,
    Clear,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            StoreOperation::Append => "append",
            StoreOperation::List => "list",
            StoreOperation::Clear => "clear",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("inspection log is unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("failed to {operation} inspection log: {source:#}")]
    Persistence {
        operation: StoreOperation,
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    fn persistence(operation: StoreOperation, source: anyhow::Error) -> Self {
        StoreError::Persistence { operation, source }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

#[derive(Clone)]
pub enum LogStore {
    Ready(Database),
    Unavailable { reason: String },
}

impl LogStore {
    pub fn open(db_path: PathBuf) -> Self {
        match Database::new(db_path.clone()) {
            Ok(db) => LogStore::Ready(db),
            Err(err) => {
                log_error!(
                    "Inspection log at {} could not be opened; persistence disabled: {err:#}",
                    db_path.display()
                );
                LogStore::Unavailable {
                    reason: format!("{err:#}"),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, LogStore::Ready(_))
    }

    fn database(&self) -> Result<&Database, StoreError> {
        match self {
            LogStore::Ready(db) => Ok(db),
            LogStore::Unavailable { reason } => Err(StoreError::Unavailable {
                reason: reason.clone(),
            }),
        }
    }

    pub async fn append(&self, inspection: NewInspection) -> Result<InspectionRecord, StoreError> {
        let record = self
            .database()?
            .append_inspection(inspection)
            .await
            .map_err(|err| StoreError::persistence(StoreOperation::Append, err))?;
        log_info!("Appended inspection {} ({})", record.id, record.outcome.as_str());
        Ok(record)
    }

    pub async fn list_all(&self) -> Result<Vec<InspectionRecord>, StoreError> {
        self.database()?
            .list_inspections()
            .await
            .map_err(|err| StoreError::persistence(StoreOperation::List, err))
    }

    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        self.database()?
            .list_inspections_between(from, to)
            .await
            .map_err(|err| StoreError::persistence(StoreOperation::List, err))
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.database()?
            .count_inspections()
            .await
            .map_err(|err| StoreError::persistence(StoreOperation::List, err))
    }

    pub async fn clear_all(&self) -> Result<u64, StoreError> {
        let removed = self
            .database()?
            .clear_inspections()
            .await
            .map_err(|err| StoreError::persistence(StoreOperation::Clear, err))?;
        log_info!("Cleared {removed} inspections");
        Ok(removed)
    }
}
