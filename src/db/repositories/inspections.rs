use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{format_datetime, parse_datetime, parse_outcome, to_u64},
    models::{InspectionRecord, NewInspection},
    Database,
};

fn row_to_inspection(row: &Row) -> Result<InspectionRecord> {
    let timestamp: String = row.get("timestamp")?;
    let outcome: String = row.get("outcome")?;

    Ok(InspectionRecord {
        id: row.get("id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        code_a: row.get("code_a")?,
        code_b: row.get("code_b")?,
        outcome: parse_outcome(&outcome)?,
    })
}

impl Database {
    /// Writes one inspection and returns it with its assigned id.
    ///
    /// Ids come from an AUTOINCREMENT sequence, so they keep growing across
    /// restarts and clears.
    pub async fn append_inspection(&self, inspection: NewInspection) -> Result<InspectionRecord> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO inspection_logs (timestamp, code_a, code_b, outcome)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    format_datetime(&inspection.timestamp),
                    inspection.code_a,
                    inspection.code_b,
                    inspection.outcome.as_str(),
                ],
            )
            .context("failed to insert inspection")?;

            let id = conn.last_insert_rowid();
            Ok(inspection.into_record(id))
        })
        .await
    }

    pub async fn list_inspections(&self) -> Result<Vec<InspectionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, code_a, code_b, outcome
                 FROM inspection_logs
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_inspection(row)?);
            }

            Ok(records)
        })
        .await
    }

    /// Inspections captured within `[from, to]`, served by the timestamp index.
    pub async fn list_inspections_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, code_a, code_b, outcome
                 FROM inspection_logs
                 WHERE timestamp >= ?1 AND timestamp <= ?2
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query(params![format_datetime(&from), format_datetime(&to)])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_inspection(row)?);
            }

            Ok(records)
        })
        .await
    }

    pub async fn count_inspections(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM inspection_logs", [], |row| row.get(0))?;
            to_u64(count, "inspection count")
        })
        .await
    }

    /// Removes every inspection in one transaction and returns how many were removed.
    pub async fn clear_inspections(&self) -> Result<u64> {
        self.execute(|conn| {
            let tx = conn
                .transaction()
                .context("failed to open clear transaction")?;
            let removed = tx
                .execute("DELETE FROM inspection_logs", [])
                .context("failed to delete inspections")?;
            tx.commit().context("failed to commit clear")?;
            Ok(removed as u64)
        })
        .await
    }
}
