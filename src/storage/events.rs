use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::tables::*;

impl Database {
    // ========================================================================
    // Event log operations
    // ========================================================================

    /// Append an event if the aggregate is still at `expected_version`.
    ///
    /// Version 0 means the aggregate does not exist yet. Returns the new version.
    pub fn append_event(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        expected_version: u64,
        data: &[u8],
    ) -> Result<u64, DatabaseError> {
        debug_assert!(!aggregate_id.is_empty(), "aggregate id must not be empty");

        let write_txn = self.begin_write()?;
        let version = expected_version + 1;
        {
            let mut aggregates = write_txn.open_table(AGGREGATES)?;
            let actual = aggregates
                .get((aggregate_type, aggregate_id))?
                .map(|v| v.value())
                .unwrap_or(0);
            if actual != expected_version {
                return Err(DatabaseError::VersionConflict {
                    aggregate_type: aggregate_type.to_string(),
                    aggregate_id: aggregate_id.to_string(),
                    expected: expected_version,
                    actual,
                });
            }
            aggregates.insert((aggregate_type, aggregate_id), version)?;

            let mut events = write_txn.open_table(EVENTS)?;
            events.insert((aggregate_type, aggregate_id, version), data)?;
        }
        write_txn.commit()?;
        Ok(version)
    }

    /// Load all events of an aggregate in version order
    pub fn load_events(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<Vec<u8>>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;

        let mut events = Vec::new();
        for entry in
            table.range((aggregate_type, aggregate_id, 0u64)..=(aggregate_type, aggregate_id, u64::MAX))?
        {
            let (_, value) = entry?;
            events.push(value.value().to_vec());
        }

        Ok(events)
    }

    /// List the ids of every aggregate of the given type, in id order
    pub fn get_aggregate_ids(&self, aggregate_type: &str) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(AGGREGATES)?;

        let mut ids = Vec::new();
        for entry in table.range((aggregate_type, "")..)? {
            let (key, _) = entry?;
            let (kind, id) = key.value();
            if kind != aggregate_type {
                break;
            }
            ids.push(id.to_string());
        }

        Ok(ids)
    }
}
