//! Range-queryable secondary indexes on top of the `sort_index` table.
//!
//! Two flavors share the table:
//! - sorted index rows map `(namespace, sort_key)` to a set of aggregate ids;
//! - list rows use the item itself as the sort key and carry no value.
//!
//! Every sorted-index id also has a row in `sort_index_positions` recording
//! the sort keys it is filed under, so removal never has to know the key the
//! caller last used and runs inside a single write transaction.

use redb::{ReadableTable, Table};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use super::db::{Database, DatabaseError};
use super::tables::*;
use crate::model::AggregateType;

type IndexTable<'txn> = Table<'txn, (&'static str, &'static str, &'static str), &'static [u8]>;

/// Smallest possible sort key; every key in a namespace compares `>=` to it.
pub const MIN_SORT_KEY: &str = "";

/// Appended to a prefix to obtain the upper bound of a "starts with" scan.
pub const MAX_SORT_KEY_SUFFIX: char = '\u{FFFF}';

/// Partition of an index: the aggregate type owning it plus the index name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexNamespace {
    aggregate_type: AggregateType,
    name: String,
}

impl IndexNamespace {
    pub fn new(aggregate_type: AggregateType, name: impl Into<String>) -> Self {
        Self {
            aggregate_type,
            name: name.into(),
        }
    }

    fn row<'a>(&'a self, sort_key: &'a str) -> (&'a str, &'a str, &'a str) {
        (self.aggregate_type.as_str(), self.name.as_str(), sort_key)
    }

    fn contains(&self, kind: &str, name: &str) -> bool {
        kind == self.aggregate_type.as_str() && name == self.name
    }
}

impl fmt::Display for IndexNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.aggregate_type, self.name)
    }
}

/// What happens to an id's previous entries when it is filed under a new key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexReplaceMode {
    /// Move the id: it ends up under exactly one sort key.
    #[default]
    Replace,
    /// Only add the new entry; previous entries stay until the id is removed.
    Append,
}

impl FromStr for IndexReplaceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(IndexReplaceMode::Replace),
            "append" => Ok(IndexReplaceMode::Append),
            other => Err(format!("unknown index replace mode \"{other}\"")),
        }
    }
}

impl Database {
    // ========================================================================
    // Sorted index operations
    // ========================================================================

    /// Attach `aggregate_id` to the entry at `(namespace, sort_key)` (idempotent).
    ///
    /// Entries the id already sits under are left alone.
    pub fn index_add(
        &self,
        namespace: &IndexNamespace,
        aggregate_id: &str,
        sort_key: &str,
    ) -> Result<(), DatabaseError> {
        debug_assert!(!aggregate_id.is_empty(), "aggregate id must not be empty");
        debug_assert!(!sort_key.is_empty(), "sort key must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut index = write_txn.open_table(SORT_INDEX)?;
            let mut positions = write_txn.open_table(SORT_INDEX_POSITIONS)?;
            attach(&mut index, &mut positions, namespace, aggregate_id, sort_key)?;
        }
        write_txn.commit()?;

        tracing::debug!(%namespace, aggregate_id, sort_key, "Indexed aggregate");
        Ok(())
    }

    /// File `aggregate_id` under `sort_key`, detaching it from every other entry
    /// in the namespace within the same transaction.
    pub fn index_replace(
        &self,
        namespace: &IndexNamespace,
        aggregate_id: &str,
        sort_key: &str,
    ) -> Result<(), DatabaseError> {
        debug_assert!(!aggregate_id.is_empty(), "aggregate id must not be empty");
        debug_assert!(!sort_key.is_empty(), "sort key must not be empty");

        let write_txn = self.begin_write()?;
        let detached = {
            let mut index = write_txn.open_table(SORT_INDEX)?;
            let mut positions = write_txn.open_table(SORT_INDEX_POSITIONS)?;
            let detached = detach(&mut index, &mut positions, namespace, aggregate_id)?;
            attach(&mut index, &mut positions, namespace, aggregate_id, sort_key)?;
            detached
        };
        write_txn.commit()?;

        tracing::debug!(%namespace, aggregate_id, sort_key, detached, "Re-indexed aggregate");
        Ok(())
    }

    /// File `aggregate_id` under `sort_key` according to `mode`.
    pub fn index_put(
        &self,
        namespace: &IndexNamespace,
        aggregate_id: &str,
        sort_key: &str,
        mode: IndexReplaceMode,
    ) -> Result<(), DatabaseError> {
        match mode {
            IndexReplaceMode::Replace => self.index_replace(namespace, aggregate_id, sort_key),
            IndexReplaceMode::Append => self.index_add(namespace, aggregate_id, sort_key),
        }
    }

    /// Remove `aggregate_id` from whichever entries currently hold it.
    ///
    /// Returns the number of entries touched; removing an unknown id is a no-op.
    pub fn index_remove(
        &self,
        namespace: &IndexNamespace,
        aggregate_id: &str,
    ) -> Result<usize, DatabaseError> {
        let write_txn = self.begin_write()?;
        let detached = {
            let mut index = write_txn.open_table(SORT_INDEX)?;
            let mut positions = write_txn.open_table(SORT_INDEX_POSITIONS)?;
            detach(&mut index, &mut positions, namespace, aggregate_id)?
        };
        write_txn.commit()?;

        if detached > 0 {
            tracing::debug!(%namespace, aggregate_id, detached, "Removed aggregate from index");
        }
        Ok(detached)
    }

    /// Ids filed under sort keys in `[from, to]` (or `[from, ∞)`), ordered by
    /// the sort key of their entry. Each id is returned once, at its lowest key.
    pub fn index_find(
        &self,
        namespace: &IndexNamespace,
        from: &str,
        to: Option<&str>,
    ) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SORT_INDEX)?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut collect = |value: &[u8]| -> Result<(), DatabaseError> {
            if value.is_empty() {
                return Ok(());
            }
            let entry: BTreeSet<String> = rmp_serde::from_slice(value)?;
            for id in entry {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            Ok(())
        };

        match to {
            Some(to) if to < from => {}
            Some(to) => {
                for entry in table.range(namespace.row(from)..=namespace.row(to))? {
                    let (_, value) = entry?;
                    collect(value.value())?;
                }
            }
            None => {
                for entry in table.range(namespace.row(from)..)? {
                    let (key, value) = entry?;
                    let (kind, name, _) = key.value();
                    if !namespace.contains(kind, name) {
                        break;
                    }
                    collect(value.value())?;
                }
            }
        }

        Ok(ids)
    }

    // ========================================================================
    // List index operations
    // ========================================================================

    /// Record the presence of `item` in the namespace
    pub fn list_add(&self, namespace: &IndexNamespace, item: &str) -> Result<(), DatabaseError> {
        debug_assert!(!item.is_empty(), "list item must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut index = write_txn.open_table(SORT_INDEX)?;
            let empty: &[u8] = &[];
            index.insert(namespace.row(item), empty)?;
        }
        write_txn.commit()?;

        tracing::debug!(%namespace, item, "Added list item");
        Ok(())
    }

    /// Clear the presence of `item`. Returns whether it was present.
    pub fn list_remove(&self, namespace: &IndexNamespace, item: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let mut index = write_txn.open_table(SORT_INDEX)?;
            let removed = index.remove(namespace.row(item))?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Items in `[from, to]` (or `[from, ∞)`) in lexical order
    pub fn list_find(
        &self,
        namespace: &IndexNamespace,
        from: &str,
        to: Option<&str>,
    ) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SORT_INDEX)?;

        let mut items = Vec::new();
        match to {
            Some(to) if to < from => {}
            Some(to) => {
                for entry in table.range(namespace.row(from)..=namespace.row(to))? {
                    let (key, _) = entry?;
                    items.push(key.value().2.to_string());
                }
            }
            None => {
                for entry in table.range(namespace.row(from)..)? {
                    let (key, _) = entry?;
                    let (kind, name, item) = key.value();
                    if !namespace.contains(kind, name) {
                        break;
                    }
                    items.push(item.to_string());
                }
            }
        }

        Ok(items)
    }
}

fn attach(
    index: &mut IndexTable<'_>,
    positions: &mut IndexTable<'_>,
    namespace: &IndexNamespace,
    aggregate_id: &str,
    sort_key: &str,
) -> Result<(), DatabaseError> {
    let mut ids: BTreeSet<String> = read_set(index, namespace.row(sort_key))?;
    if ids.insert(aggregate_id.to_string()) {
        let data = rmp_serde::to_vec_named(&ids)?;
        index.insert(namespace.row(sort_key), data.as_slice())?;
    }

    let mut keys: BTreeSet<String> = read_set(positions, namespace.row(aggregate_id))?;
    if keys.insert(sort_key.to_string()) {
        let data = rmp_serde::to_vec_named(&keys)?;
        positions.insert(namespace.row(aggregate_id), data.as_slice())?;
    }
    Ok(())
}

fn detach(
    index: &mut IndexTable<'_>,
    positions: &mut IndexTable<'_>,
    namespace: &IndexNamespace,
    aggregate_id: &str,
) -> Result<usize, DatabaseError> {
    let keys: Vec<String> = match positions.remove(namespace.row(aggregate_id))? {
        Some(data) => rmp_serde::from_slice::<BTreeSet<String>>(data.value())?
            .into_iter()
            .collect(),
        None => scan_for(index, namespace, aggregate_id)?,
    };

    let mut detached = 0;
    for key in &keys {
        let mut ids = read_set(index, namespace.row(key))?;
        if !ids.remove(aggregate_id) {
            continue;
        }
        if ids.is_empty() {
            index.remove(namespace.row(key))?;
        } else {
            let data = rmp_serde::to_vec_named(&ids)?;
            index.insert(namespace.row(key), data.as_slice())?;
        }
        detached += 1;
    }
    Ok(detached)
}

/// Sort keys of every entry in the namespace holding `aggregate_id`.
/// Used for rows that were written without a positions record.
fn scan_for(
    index: &IndexTable<'_>,
    namespace: &IndexNamespace,
    aggregate_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    let mut keys = Vec::new();
    for entry in index.range(namespace.row(MIN_SORT_KEY)..)? {
        let (key, value) = entry?;
        let (kind, name, sort_key) = key.value();
        if !namespace.contains(kind, name) {
            break;
        }
        if value.value().is_empty() {
            continue;
        }
        let ids: BTreeSet<String> = rmp_serde::from_slice(value.value())?;
        if ids.contains(aggregate_id) {
            keys.push(sort_key.to_string());
        }
    }
    Ok(keys)
}

fn read_set(
    table: &IndexTable<'_>,
    row: (&str, &str, &str),
) -> Result<BTreeSet<String>, DatabaseError> {
    Ok(table
        .get(row)?
        .filter(|v| !v.value().is_empty())
        .map(|v| rmp_serde::from_slice(v.value()))
        .transpose()?
        .unwrap_or_default())
}
