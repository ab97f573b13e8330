use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::tables::*;

impl Database {
    // ========================================================================
    // Relation index operations
    // ========================================================================

    /// File `aggregate_id` under `key` of the given relation (idempotent)
    pub fn add_related_id(
        &self,
        aggregate_type: &str,
        relation: &str,
        key: &str,
        aggregate_id: &str,
    ) -> Result<(), DatabaseError> {
        debug_assert!(!key.is_empty(), "relation key must not be empty");
        debug_assert!(!aggregate_id.is_empty(), "aggregate id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(RELATIONS)?;
            let mut ids: Vec<String> = table
                .get((aggregate_type, relation, key))?
                .map(|v| rmp_serde::from_slice(v.value()))
                .transpose()?
                .unwrap_or_default();

            if !ids.iter().any(|id| id == aggregate_id) {
                ids.push(aggregate_id.to_string());
                let data = rmp_serde::to_vec_named(&ids)?;
                table.insert((aggregate_type, relation, key), data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove `aggregate_id` from `key` of the given relation
    pub fn remove_related_id(
        &self,
        aggregate_type: &str,
        relation: &str,
        key: &str,
        aggregate_id: &str,
    ) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(RELATIONS)?;
            let ids: Option<Vec<String>> = table
                .get((aggregate_type, relation, key))?
                .map(|v| rmp_serde::from_slice(v.value()))
                .transpose()?;

            if let Some(mut ids) = ids {
                ids.retain(|id| id != aggregate_id);
                if ids.is_empty() {
                    table.remove((aggregate_type, relation, key))?;
                } else {
                    let data = rmp_serde::to_vec_named(&ids)?;
                    table.insert((aggregate_type, relation, key), data.as_slice())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove `aggregate_id` from every key of the given relation
    pub fn remove_relation(
        &self,
        aggregate_type: &str,
        relation: &str,
        aggregate_id: &str,
    ) -> Result<usize, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut touched = 0;
        {
            let mut table = write_txn.open_table(RELATIONS)?;

            // Collect matching rows first, then rewrite them
            let mut matches: Vec<(String, Vec<String>)> = Vec::new();
            for entry in table.range((aggregate_type, relation, "")..)? {
                let (key, value) = entry?;
                let (kind, rel, k) = key.value();
                if kind != aggregate_type || rel != relation {
                    break;
                }
                let ids: Vec<String> = rmp_serde::from_slice(value.value())?;
                if ids.iter().any(|id| id == aggregate_id) {
                    matches.push((k.to_string(), ids));
                }
            }

            for (k, mut ids) in matches {
                ids.retain(|id| id != aggregate_id);
                if ids.is_empty() {
                    table.remove((aggregate_type, relation, k.as_str()))?;
                } else {
                    let data = rmp_serde::to_vec_named(&ids)?;
                    table.insert((aggregate_type, relation, k.as_str()), data.as_slice())?;
                }
                touched += 1;
            }
        }
        write_txn.commit()?;
        Ok(touched)
    }

    /// Get all ids filed under `key` of the given relation, in insertion order
    pub fn find_by_related_id(
        &self,
        aggregate_type: &str,
        relation: &str,
        key: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(RELATIONS)?;

        match table.get((aggregate_type, relation, key))? {
            Some(data) => Ok(rmp_serde::from_slice(data.value())?),
            None => Ok(Vec::new()),
        }
    }
}
