
use super::db::{Database, DatabaseError};
use super::tables::*;

impl Database {
    /// Read a bookkeeping value
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(META)?;

        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Store a bookkeeping value
    pub fn put_meta(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(META)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
